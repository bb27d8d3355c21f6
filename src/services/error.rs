use thiserror::Error;

use crate::models::HireStatus;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input; the caller corrects and resubmits.
    #[error("{0}")]
    Validation(String),

    #[error("You do not have permission to perform this action")]
    Authorization,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Cannot change status from {current} to {attempted}")]
    InvalidTransition {
        current: HireStatus,
        attempted: HireStatus,
    },

    /// Payment gateway or network failure. Safe for the user to retry.
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(err: mongodb::error::Error) -> Self {
        ServiceError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ServiceError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ServiceError::Database(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
