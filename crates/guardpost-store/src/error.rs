use thiserror::Error;

use crate::batch::MAX_BATCH_OPS;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A batch asked for more primitive operations than one atomic commit
    /// supports. Callers are expected to chunk.
    #[error("Batch of {size} operations exceeds the {MAX_BATCH_OPS}-op ceiling")]
    BatchTooLarge { size: usize },

    /// An `Update` targeted a document that does not exist. The whole batch
    /// is rolled back.
    #[error("Document not found: {collection}/{id}")]
    MissingDocument { collection: String, id: String },

    /// A `require_no_match` guard found a matching document. Nothing was
    /// applied.
    #[error("Precondition failed: {collection} already contains a matching document")]
    PreconditionFailed { collection: String },

    /// A `Set`/`Update` payload was not a JSON object.
    #[error("Document payload for {collection}/{id} must be a JSON object")]
    NotAnObject { collection: String, id: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
