//! Top-level error types for Quorum.

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing credential for provider: {0}")]
    MissingCredential(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Document store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open store at {path}: {source}")]
    Open {
        path: String,
        source: redb::DatabaseError,
    },

    #[error("store transaction failed: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("store table access failed: {0}")]
    Table(#[from] redb::TableError),

    #[error("store read/write failed: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("store commit failed: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("failed to encode stored document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Provider registry errors. Resolution is the only place provider names
/// are validated.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Judge call and verdict parsing errors. These never reach API callers;
/// the analyzer collapses them into a generic failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("judge reply missing {0} section")]
    MissingSection(&'static str),

    #[error("judge chose a provider outside the known set: {0}")]
    InvalidProviderName(String),

    #[error("judge request failed: {0}")]
    JudgeRequest(String),
}
