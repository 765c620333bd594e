use async_trait::async_trait;
use serde_json::Value;

use crate::{batch::WriteBatch, document::Document, error::Result};

/// Common interface over the document database.
///
/// Implementations must be `Send + Sync`; every lifecycle component holds
/// one behind an `Arc<dyn DocumentStore>` and may issue reads concurrently
/// (e.g. today's and yesterday's schedules in parallel). `apply` is the
/// only mutation path and must be atomic: either every operation in the
/// batch becomes visible or none does.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection`, in unspecified order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Documents matching *all* top-level field-equality filters.
    async fn query(&self, collection: &str, filters: &[(&str, Value)]) -> Result<Vec<Document>>;

    /// First match for the filters, or `None`. Order is unspecified — use
    /// only for existence-style lookups.
    async fn find_first(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
    ) -> Result<Option<Document>>;

    /// Atomically commit a batch. Preconditions are evaluated inside the
    /// same transaction as the writes.
    async fn apply(&self, batch: WriteBatch) -> Result<()>;
}
