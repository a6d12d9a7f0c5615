// Durable key-value persistence for the quote collection and filter state
pub mod store;

pub use store::{MemoryStore, SqliteStore, StoreError, StringStore};
pub use store::{KEY_FILTER, KEY_QUOTES};

pub type Result<T> = std::result::Result<T, StoreError>;
