//! Error types for the depot core

use thiserror::Error;

/// Main error type for depot-core operations
#[derive(Error, Debug)]
pub enum DepotError {
    /// Base64 decoding failed
    #[error("invalid base64: {0}")]
    BadBase64(#[from] base64::DecodeError),

    /// A key or ciphertext did not have the expected byte length
    #[error("wrong key length: expected {expected}, got {got}")]
    WrongKeyLength { expected: usize, got: usize },

    /// An operation needed a private key but the keypair is public-only
    #[error("keypair has no private key")]
    MissingPrivateKey,

    /// Generic authenticated decryption failure (bad key, tampered data, or malformed input)
    #[error("decryption failed")]
    DecryptionFailed,

    /// The envelope payload field failed to decrypt under the recovered symmetric key
    #[error("payload decryption failed")]
    PayloadDecryptionFailed,

    /// The envelope sender field failed to decrypt under the recovered symmetric key
    #[error("sender decryption failed")]
    SenderDecryptionFailed,

    /// A recipient slot failed to decrypt or did not yield a well-formed symmetric key
    #[error("recipient slot decryption failed")]
    SlotDecryptionFailed,

    /// No combination of the caller's keys opened any recipient slot
    #[error("no provided key matches a recipient slot")]
    NoRecipient,

    /// Envelope JSON/base64 structure was invalid
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Requested key is absent from the bucket
    #[error("no such key")]
    NoSuchKey,

    /// Requested bucket does not exist
    #[error("no such bucket: {0}")]
    NoSuchBucket(String),

    /// Database creation/opening error
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("storage error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using DepotError
pub type DepotResult<T> = Result<T, DepotError>;
