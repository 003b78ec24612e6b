use crate::stores::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// A required field was missing or unusable on a creation call.
    /// Numeric fields are never rejected; they coerce to zero upstream.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The record does not exist for this owner. Distinct from a storage
    /// failure so callers can answer 404 instead of 500.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A storage/transport failure, propagated unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),
}
