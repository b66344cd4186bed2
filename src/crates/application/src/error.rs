use domain::listener::ListenerError;
use domain::milestone::MilestoneError;
use domain::value::ValueError;
use model::ModelError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Aggregate not found: {0}: {1}")]
    AggregateNotFound(String, String),
    /// 暂时性错误，调用方应使用相同内容重试
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl AppError {
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }
}

impl From<ValueError> for AppError {
    fn from(err: ValueError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<ListenerError> for AppError {
    fn from(err: ListenerError) -> Self {
        match err {
            ListenerError::ValidationError(msg) => AppError::InvalidInput(msg),
            ListenerError::NotFound(id) => AppError::AggregateNotFound("Listener".to_string(), id),
            ListenerError::DbErr(msg) => AppError::StorageUnavailable(msg),
        }
    }
}

impl From<MilestoneError> for AppError {
    fn from(err: MilestoneError) -> Self {
        match err {
            MilestoneError::DbErr(msg) => AppError::StorageUnavailable(msg),
            MilestoneError::UnknownKind(_)
            | MilestoneError::UnknownPolicy(_)
            | MilestoneError::InvalidLadder(_) => AppError::InvalidInput(err.to_string()),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}
