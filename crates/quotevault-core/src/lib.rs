// Core business logic lives here - the repository, the merge, the cache
pub mod config;
pub mod error;
pub mod interchange;
pub mod models;
pub mod repository;
pub mod session;
pub mod sync;

pub use config::Config;
pub use error::Error;
pub use interchange::ImportReport;
pub use models::{Quote, QuotePatch, SyncResult};
pub use repository::QuoteRepository;
pub use session::SessionCache;
pub use sync::{SyncHandle, Syncer};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
