pub mod listener;
pub mod listening_report;
pub mod milestone;
