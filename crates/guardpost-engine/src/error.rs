use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Read/write failure against the document store. Never recovered
    /// locally — the invocation aborts and the trigger host retries on its
    /// next tick.
    #[error("Store error: {0}")]
    Store(#[from] guardpost_store::StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
