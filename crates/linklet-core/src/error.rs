use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error taxonomy shared by every storage backend.
///
/// `NotFound` and `Deleted` are deliberately distinct: a deleted record's
/// identifier keeps resolving to `Deleted` so callers can render "gone"
/// rather than "never existed".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no record for identifier")]
    NotFound,
    #[error("record is deleted")]
    Deleted,
    #[error("batch saved {saved} of {submitted} urls")]
    PartialBatch { submitted: usize, saved: usize },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}
