pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use error::{Result, StorageError};
pub use repository::{
    JsonFileRepository, JsonFileStore, KeyValueStore, MemoryRepository, MemoryStore, Record,
    Repository,
};
