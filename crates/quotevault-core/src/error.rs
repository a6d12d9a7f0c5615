use thiserror::Error;

/// All the ways things can go wrong in quotevault
///
/// We use thiserror here because it generates the boilerplate for us.
/// No failure in this taxonomy is fatal: validation aborts the operation
/// with no state change, storage keeps the in-memory mutation, network
/// leaves the prior collection intact, import rejects wholesale.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("quote not found: {0}")]
    NotFound(String),

    #[error("storage failed: {0}")]
    Storage(#[from] quotevault_store::StoreError),

    #[error("remote unavailable: {0}")]
    Network(#[from] quotevault_remote::RemoteError),

    #[error("import rejected: {0}")]
    Import(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
