use thiserror::Error;

/// Errors that can arise while interacting with the asset storage layer.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON documents that fail to serialize or parse.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, blob files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be read or written.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Stored payload is not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Input rejected before any state was touched.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Returned when opening a database written with another schema version.
    #[error("schema mismatch: expected version {expected}, found {found}")]
    SchemaMismatch { expected: u8, found: u8 },

    /// Archive parsed but none of the audio/, images/ or data/ folders had files.
    #[error("no recognized content in archive (expected audio/, images/ or data/ folders)")]
    NoRecognizedContent,

    /// Failures reported by a blob host or other unexpected conditions.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sled::transaction::TransactionError<AssetError>> for AssetError {
    fn from(err: sled::transaction::TransactionError<AssetError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(e) => AssetError::Sled(e),
        }
    }
}
