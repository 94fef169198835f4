// Data models module
pub mod guild;
