pub mod listener;
pub mod milestone;
pub mod value;
