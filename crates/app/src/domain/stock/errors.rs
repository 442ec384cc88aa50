//! Stock ledger errors.

use imprint::stock::StockError;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StockLedgerError {
    #[error("variant not found")]
    VariantNotFound,

    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: u64, requested: u64 },

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("stock arithmetic failed")]
    Stock(#[from] StockError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl StockLedgerError {
    /// Whether the failure is transient and the call may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Sql(_))
    }
}

impl From<Error> for StockLedgerError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::VariantNotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
