use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::{KeyValueStore, Record, Repository, upsert};
use crate::error::Result;

/// Collection stored as a single JSON array at `<dir>/<collection>.json`.
///
/// Every operation reads the file, so edits made by another process between
/// calls are picked up. Writes go through a temporary file and a rename.
pub struct JsonFileRepository<T: Record> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<T>,
}

impl<T: Record> JsonFileRepository<T> {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", T::COLLECTION)),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<T::Key, T>> {
        let Some(records) = read_json::<Vec<T>>(&self.path).await? else {
            return Ok(BTreeMap::new());
        };

        let mut map = BTreeMap::new();
        for record in records {
            // Hand-edited files may lack keys.
            upsert(&mut map, record)?;
        }
        Ok(map)
    }

    async fn store(&self, records: &BTreeMap<T::Key, T>) -> Result<()> {
        let list: Vec<&T> = records.values().collect();
        write_json(&self.path, &list).await
    }
}

#[async_trait::async_trait]
impl<T: Record> Repository<T> for JsonFileRepository<T> {
    async fn get_all(&self) -> Result<Vec<T>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_values().collect())
    }

    async fn get(&self, key: &T::Key) -> Result<Option<T>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn put(&self, record: T) -> Result<T::Key> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let key = upsert(&mut records, record)?;
        self.store(&records).await?;
        debug!("Stored {} record {}", T::COLLECTION, key);
        Ok(key)
    }

    async fn delete(&self, key: &T::Key) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        if records.remove(key).is_none() {
            return Ok(false);
        }
        self.store(&records).await?;
        debug!("Deleted {} record {}", T::COLLECTION, key);
        Ok(true)
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store(&BTreeMap::new()).await
    }

    async fn count(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.len())
    }
}

/// Key-value documents stored one file per key under `<dir>/kv/`.
pub struct JsonFileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().join("kv"),
            lock: Mutex::new(()),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_stem))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        read_json(&self.path_for(key)).await
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        write_json(&self.path_for(key), &value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckpointRecord, Competitor};
    use serde_json::json;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("strongman-store-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_records_survive_a_new_handle() {
        let dir = scratch_dir();

        let repo = JsonFileRepository::<Competitor>::new(&dir);
        repo.put(Competitor::new("Anna")).await.unwrap();
        repo.put(Competitor::new("Bartek")).await.unwrap();

        let reopened = JsonFileRepository::<Competitor>::new(&dir);
        let names: Vec<String> = reopened
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Anna", "Bartek"]);
        assert!(reopened.path().ends_with("competitors.json"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_empty_collection() {
        let dir = scratch_dir();
        let repo = JsonFileRepository::<CheckpointRecord>::new(dir.join("nested"));

        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(!repo.delete(&"cp_missing".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_checkpoint_keys_are_kept() {
        let dir = scratch_dir();
        let repo = JsonFileRepository::<CheckpointRecord>::new(&dir);

        let record = CheckpointRecord::new(Some("Po 3 konkurencji".to_string()), json!({"eventNumber": 3}));
        let key = repo.put(record.clone()).await.unwrap();

        assert_eq!(key, record.key);
        assert_eq!(repo.get(&key).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_key_value_files() {
        let dir = scratch_dir();
        let store = JsonFileStore::new(&dir);

        store.put("strongman_autoSave_v1", json!({"eventNumber": 2})).await.unwrap();
        assert_eq!(
            store.get("strongman_autoSave_v1").await.unwrap(),
            Some(json!({"eventNumber": 2}))
        );
        assert!(store.delete("strongman_autoSave_v1").await.unwrap());
        assert!(!store.delete("strongman_autoSave_v1").await.unwrap());
    }
}
