//! Product variants service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VariantsServiceError {
    #[error("variant already exists")]
    AlreadyExists,

    #[error("variant not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("variant name cannot be empty")]
    EmptyName,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl VariantsServiceError {
    /// Whether the failure is transient and the call may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Sql(_))
    }
}

impl From<Error> for VariantsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let error = VariantsServiceError::from(Error::RowNotFound);

        assert!(matches!(error, VariantsServiceError::NotFound));
        assert!(!error.is_retryable());
    }

    #[test]
    fn pool_failures_are_retryable() {
        let error = VariantsServiceError::from(Error::PoolTimedOut);

        assert!(matches!(error, VariantsServiceError::Sql(_)));
        assert!(error.is_retryable());
        assert_eq!(error.to_string(), "storage error");
    }
}
