use thiserror::Error;

/// Storage failure surfaced to callers.
///
/// Absence of a record is never an error: lookups return `Option` or an
/// empty `Vec` instead. Every backend failure propagates immediately; the
/// store performs no retries of its own.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}
