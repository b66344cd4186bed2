use thiserror::Error;

pub mod get_leaderboard;
pub mod get_listener;
pub mod get_milestones;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Execution error: {0}")]
    ExecutionError(String),
}
