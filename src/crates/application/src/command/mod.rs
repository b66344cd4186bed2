pub mod listener;
pub mod listening;
pub mod milestone;
pub mod shared;
