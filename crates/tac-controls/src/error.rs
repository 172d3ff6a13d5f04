use thiserror::Error;

/// Error taxonomy shared by every control service and store.
///
/// Anything that affects order admission propagates as one of these; there is
/// no "allow the trade" fallback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// A requested record does not exist and there is no safe default.
    #[error("missing data: {what}")]
    MissingData { what: String },

    /// A temporary value is already stashed for this key. Overwriting it would
    /// lose the value needed for restoration.
    #[error("temporary value already stashed for '{key}'")]
    AlreadyStashed { key: String },

    /// Restore requested but nothing is stashed for this key.
    #[error("no temporary value stashed for '{key}'")]
    NothingStashed { key: String },

    /// Configuration lookup (category or stale lists) failed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backing store failed to read or write.
    #[error("storage error: {0}")]
    Storage(String),

    /// An order quantity no stage can represent (e.g. `i64::MIN`).
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// A destructive operation was refused (e.g. missing confirmation).
    #[error("refused: {0}")]
    Refused(String),
}

impl ControlError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingData { what: what.into() }
    }

    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Self::Storage(msg.to_string())
    }
}

pub type ControlResult<T> = Result<T, ControlError>;
