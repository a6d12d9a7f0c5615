// HTTP client for the remote quote mirror - knows wire shapes, not Quotes
pub mod client;
pub mod retry;

pub use client::{RemoteClient, RemoteError, RemotePost, DEFAULT_BASE_URL};
pub use retry::{is_retryable_status, with_retry, RetryConfig};

pub type Result<T> = std::result::Result<T, RemoteError>;
