// Utility functions module
pub mod config;
pub mod languages;
