use thiserror::Error;

use crate::api_client::ApiError;

/// Application-level error type.
/// Every session and mutation operation returns `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the server rejected the credentials (401 / 403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AppError::Api(ApiError::Status { status, .. }) if *status == 401 || *status == 403
        )
    }

    /// HTTP status of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api(ApiError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}
