use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("{0}")]
    Message(String),
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Message(format!("payload serialization failed: {error}"))
    }
}

pub type AppResult<T> = Result<T, AppError>;
