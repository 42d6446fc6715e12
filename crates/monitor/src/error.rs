use vitasense_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("monitor already started")]
    AlreadyStarted,
}
