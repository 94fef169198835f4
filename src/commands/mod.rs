// Bot commands module
pub mod announce;
pub mod channels;
pub mod translate;
