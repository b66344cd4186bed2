use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use application::error::AppError;
use application::query::QueryError;
use log::error;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    /// 存储暂不可用，客户端应使用相同内容重试
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_input",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Unavailable(_) => "storage_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidInput(msg) => ApiError::BadRequest(msg),
            AppError::AggregateNotFound(kind, id) => {
                ApiError::NotFound(format!("{} {} not found", kind, id))
            }
            AppError::StorageUnavailable(msg) => ApiError::Unavailable(msg),
            AppError::UnknownError(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidInput(msg) => ApiError::BadRequest(msg),
            QueryError::NotFound(msg) => ApiError::NotFound(msg),
            QueryError::ExecutionError(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self, ApiError::Unavailable(_) | ApiError::Internal(_)) {
            error!("request failed: {}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.code(),
            message: self.to_string(),
        })
    }
}
