pub mod db_data;
pub mod listener;
pub mod milestone;
