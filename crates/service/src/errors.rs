use thiserror::Error;

use models::errors::ModelError;

use crate::store::KeyKind;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the store contract. Every backend reports through these.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("record not found")]
    NotFound,
    #[error("record is not uniquely described by key value pair")]
    NotUnique,
    #[error("record already exists")]
    AlreadyExists,
    #[error("invalid key type for this operation: {0}")]
    InvalidKeyKind(KeyKind),
    #[error("unknown key type: {0}")]
    UnknownKeyKind(String),
    #[error("error creating database: {0}")]
    Create(String),
    #[error("error opening database: {0}")]
    Open(String),
    #[error("error reading from database: {0}")]
    Read(String),
    #[error("error writing to database: {0}")]
    Write(String),
    #[error("error closing database: {0}")]
    Close(String),
    #[error("database is closed")]
    Closed,
}

impl From<ModelError> for StoreError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => Self::Malformed(msg),
            ModelError::Db(msg) => Self::Open(msg),
        }
    }
}

/// Failures delivering an over-assignment alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("encoding notification: {0}")]
    Encode(String),
    #[error("sending notification: {0}")]
    Network(String),
    #[error("notification rejected with status {0}")]
    Status(u16),
}

/// Error surfaced by [`crate::inventory::Inventory`] operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("error reporting over-assignment: {0}")]
    Notify(#[from] NotifyError),
}
