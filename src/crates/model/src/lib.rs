pub mod leaderboard;
pub mod milestone_feed;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Database error: {0}")]
    DbErr(String),
}
