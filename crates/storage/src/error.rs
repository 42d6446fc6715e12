use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: '{0}'")]
    InvalidKey(String),

    #[error("store lock poisoned")]
    Poisoned,
}
