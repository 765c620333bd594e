use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use guardpost_store::{collections, models::checkpoint_baseline, DocumentStore, WriteBatch};
use guardpost_triggers::{TaskError, TriggerTask};
use tracing::{debug, info};

use crate::error::Result;

/// Updates per batch — same chunking discipline the archiver uses for its
/// checkpoint resets, so an arbitrarily large checkpoint fleet never
/// overruns the store's per-batch ceiling.
const RESET_CHUNK: usize = 400;

/// Daily reset of every checkpoint to the unscanned baseline.
pub struct CheckpointResetter {
    store: Arc<dyn DocumentStore>,
}

impl CheckpointResetter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn reset_all(&self) -> Result<()> {
        info!("running daily checkpoint status reset");

        let checkpoints = self.store.list(collections::CHECKPOINTS).await?;
        if checkpoints.is_empty() {
            info!("no checkpoints found to reset");
            return Ok(());
        }

        for chunk in checkpoints.chunks(RESET_CHUNK) {
            let mut batch = WriteBatch::new();
            for doc in chunk {
                debug!(checkpoint = %doc.id, "resetting checkpoint status");
                batch.update(collections::CHECKPOINTS, &doc.id, checkpoint_baseline());
            }
            self.store.apply(batch).await?;
        }

        info!(count = checkpoints.len(), "checkpoint statuses reset");
        Ok(())
    }
}

#[async_trait]
impl TriggerTask for CheckpointResetter {
    async fn run(&self, _now: DateTime<FixedOffset>) -> std::result::Result<(), TaskError> {
        self.reset_all().await.map_err(Into::into)
    }
}
