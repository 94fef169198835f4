// External API clients module
pub mod translate;
