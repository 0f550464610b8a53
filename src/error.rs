use thiserror::Error;
use uuid::Uuid;

/// Unified error type for store and aggregator operations.
#[derive(Debug, Error)]
pub enum MobilityError {
    /// A point failed validation before reaching storage.
    #[error("invalid mobility point: {0}")]
    InvalidData(String),

    /// A point with this uuid is already stored. Surfaced by the insert
    /// layer; `MobilityStore::create` absorbs it as a client retry.
    #[error("duplicate mobility point {id}")]
    Duplicate { id: Uuid },

    /// A stored row no longer parses back into a valid point.
    #[error("corrupt mobility record {uuid}: {reason}")]
    CorruptRecord { uuid: String, reason: String },

    /// The underlying storage engine failed.
    #[error("storage failure during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl MobilityError {
    /// Maps an sqlx error into `Storage`, tagged with the failing operation.
    pub(crate) fn storage(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Storage { operation, source }
    }
}

/// Result type alias for store and aggregator operations.
pub type Result<T> = std::result::Result<T, MobilityError>;
