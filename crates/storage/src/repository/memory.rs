use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{KeyValueStore, Record, Repository, upsert};
use crate::error::Result;

pub struct MemoryRepository<T: Record> {
    records: RwLock<BTreeMap<T::Key, T>>,
}

impl<T: Record> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T: Record> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<T: Record> Repository<T> for MemoryRepository<T> {
    async fn get_all(&self) -> Result<Vec<T>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get(&self, key: &T::Key) -> Result<Option<T>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, record: T) -> Result<T::Key> {
        let mut records = self.records.write().await;
        upsert(&mut records, record)
    }

    async fn delete(&self, key: &T::Key) -> Result<bool> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.values.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Competitor, Direction, EventDefinition};
    use serde_json::json;

    #[tokio::test]
    async fn test_put_assigns_incrementing_ids() {
        let repo = MemoryRepository::<Competitor>::new();
        let first = repo.put(Competitor::new("Anna")).await.unwrap();
        let second = repo.put(Competitor::new("Bartek")).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_put_with_key_updates_in_place() {
        let repo = MemoryRepository::<EventDefinition>::new();
        let id = repo
            .put(EventDefinition::new("Yoke", Direction::High))
            .await
            .unwrap();

        let mut edited = repo.get(&id).await.unwrap().unwrap();
        edited.direction = Direction::Low;
        repo.put(edited).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.get(&id).await.unwrap().unwrap().direction, Direction::Low);
    }

    #[tokio::test]
    async fn test_duplicate_competitor_name_is_rejected() {
        let repo = MemoryRepository::<Competitor>::new();
        repo.put(Competitor::new("Anna")).await.unwrap();

        let err = repo.put(Competitor::new("Anna")).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_invalid_competitor_is_rejected() {
        let repo = MemoryRepository::<Competitor>::new();
        assert!(repo.put(Competitor::new("")).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let repo = MemoryRepository::<Competitor>::new();
        let id = repo.put(Competitor::new("Anna")).await.unwrap();
        repo.put(Competitor::new("Bartek")).await.unwrap();

        assert!(repo.delete(&id).await.unwrap());
        assert!(!repo.delete(&id).await.unwrap());
        repo.clear().await.unwrap();
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_value_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());

        store.put("pref", json!(true)).await.unwrap();
        assert_eq!(store.get("pref").await.unwrap(), Some(json!(true)));
        assert!(store.delete("pref").await.unwrap());
        assert!(store.get("pref").await.unwrap().is_none());
    }
}
