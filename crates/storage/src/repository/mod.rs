//! Async storage seams used by the competition crate.
//!
//! Every collection (roster, event catalog, checkpoints) goes through [`Repository`],
//! single documents (autosave, preferences) through [`KeyValueStore`]. Two backends
//! are provided: in-memory for tests and embedding, JSON files for the CLI.

mod json_file;
mod memory;

pub use json_file::{JsonFileRepository, JsonFileStore};
pub use memory::{MemoryRepository, MemoryStore};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::hash::Hash;
use validator::Validate;

use crate::error::{Result, StorageError};
use crate::models::{CheckpointRecord, Competitor, EventDefinition, checkpoint};

/// A value that lives in a keyed collection.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Key: Clone + Ord + Hash + Display + Send + Sync + Serialize + DeserializeOwned;

    /// File stem used by the JSON backend.
    const COLLECTION: &'static str;

    fn key(&self) -> Option<Self::Key>;

    fn set_key(&mut self, key: Self::Key);

    /// Key for a record inserted without one.
    fn next_key<'a, I>(existing: I) -> Self::Key
    where
        I: Iterator<Item = &'a Self::Key>,
        Self::Key: 'a;

    /// Value that must be unique across the collection, if any.
    fn unique_name(&self) -> Option<&str> {
        None
    }

    fn check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait::async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn get_all(&self) -> Result<Vec<T>>;

    async fn get(&self, key: &T::Key) -> Result<Option<T>>;

    /// Insert or update. Returns the key of the stored record.
    async fn put(&self, record: T) -> Result<T::Key>;

    /// Returns whether a record was removed.
    async fn delete(&self, key: &T::Key) -> Result<bool>;

    async fn clear(&self) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}

#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn put(&self, key: &str, value: Value) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Shared insert-or-update logic for both backends.
pub(crate) fn upsert<T: Record>(records: &mut BTreeMap<T::Key, T>, mut record: T) -> Result<T::Key> {
    record.check()?;

    let key = match record.key() {
        Some(key) => key,
        None => {
            let key = T::next_key(records.keys());
            record.set_key(key.clone());
            key
        }
    };

    if let Some(name) = record.unique_name() {
        let clash = records
            .iter()
            .any(|(k, existing)| *k != key && existing.unique_name() == Some(name));
        if clash {
            return Err(StorageError::ConstraintViolation(format!(
                "'{}' already exists in {}",
                name,
                T::COLLECTION
            )));
        }
    }

    records.insert(key.clone(), record);
    Ok(key)
}

fn next_numeric_key<'a, I: Iterator<Item = &'a i64>>(existing: I) -> i64 {
    existing.max().copied().unwrap_or(0) + 1
}

impl Record for Competitor {
    type Key = i64;
    const COLLECTION: &'static str = "competitors";

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn next_key<'a, I>(existing: I) -> i64
    where
        I: Iterator<Item = &'a i64>,
    {
        next_numeric_key(existing)
    }

    fn unique_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn check(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }
}

impl Record for EventDefinition {
    type Key = i64;
    const COLLECTION: &'static str = "events";

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn next_key<'a, I>(existing: I) -> i64
    where
        I: Iterator<Item = &'a i64>,
    {
        next_numeric_key(existing)
    }

    fn check(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }
}

impl Record for CheckpointRecord {
    type Key = String;
    const COLLECTION: &'static str = "checkpoints";

    fn key(&self) -> Option<String> {
        Some(self.key.clone()).filter(|k| !k.is_empty())
    }

    fn set_key(&mut self, key: String) {
        self.key = key;
    }

    fn next_key<'a, I>(_existing: I) -> String
    where
        I: Iterator<Item = &'a String>,
    {
        checkpoint::generate_key()
    }
}
