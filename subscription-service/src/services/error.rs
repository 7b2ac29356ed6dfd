use crate::services::query::QueryError;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("Failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid field {path}: {message}")]
    InvalidField { path: String, message: String },

    #[error("Duplicate field value entered")]
    DuplicateKey,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,
}

impl ServiceError {
    pub fn invalid_field(path: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::InvalidField {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        ServiceError::InvalidField {
            path: err.path,
            message: err.message,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Encode(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::Decode(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidField { path, message } => AppError::InvalidField { path, message },
            ServiceError::DuplicateKey => {
                AppError::BadRequest(anyhow::anyhow!("Duplicate field value entered"))
            }
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!(what)),
            ServiceError::InvalidCredentials => {
                AppError::BadRequest(anyhow::anyhow!("Incorrect email or password"))
            }
            ServiceError::UserAlreadyExists => {
                AppError::BadRequest(anyhow::anyhow!("User already exists"))
            }
        }
    }
}
