//! Write-behind mirror of the live competition: debounced autosave,
//! named checkpoints, and import/export of state documents.
//!
//! Storage failures are logged and reported through the [`Notifier`] before
//! being returned; the in-memory state is never touched here.

mod autosave;
mod sanitize;

pub use autosave::{AUTOSAVE_KEY, Autosaver, DEFAULT_AUTOSAVE_DELAY};
pub use sanitize::{MAX_DEPTH, sanitize};

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use storage::models::CheckpointRecord;
use storage::{KeyValueStore, Repository, StorageError};
use tracing::{error, info, warn};

use crate::error::PersistenceError;
use crate::models::CompetitionState;
use crate::notify::{Confirmer, Notifier, NotifyLevel};
use crate::validator::{StateValidator, ValidationReport};

pub const AUTOSAVE_ENABLED_KEY: &str = "strongman_autosave_enabled_v1";
pub const THEME_KEY: &str = "strongmanTheme_v12";
pub const DEFAULT_THEME: &str = "light";

pub const RESTORE_SESSION_PROMPT: &str = "Wykryto niezakończoną sesję. Czy chcesz ją przywrócić?";

type Result<T> = std::result::Result<T, PersistenceError>;

pub struct PersistenceCoordinator {
    kv: Arc<dyn KeyValueStore>,
    checkpoints: Arc<dyn Repository<CheckpointRecord>>,
    notifier: Arc<dyn Notifier>,
    autosaver: Autosaver,
    autosave_enabled: bool,
}

impl PersistenceCoordinator {
    /// Loads the autosave preference and starts the autosave writer. A
    /// missing or unreadable preference means autosave is on.
    pub async fn new(
        kv: Arc<dyn KeyValueStore>,
        checkpoints: Arc<dyn Repository<CheckpointRecord>>,
        notifier: Arc<dyn Notifier>,
        autosave_delay: Duration,
    ) -> Self {
        let autosave_enabled = match kv.get(AUTOSAVE_ENABLED_KEY).await {
            Ok(Some(Value::Bool(flag))) => flag,
            Ok(_) => true,
            Err(e) => {
                warn!("Could not read autosave preference: {}", e);
                true
            }
        };
        let autosaver = Autosaver::spawn(kv.clone(), notifier.clone(), autosave_delay);

        Self {
            kv,
            checkpoints,
            notifier,
            autosaver,
            autosave_enabled,
        }
    }

    pub fn autosave_enabled(&self) -> bool {
        self.autosave_enabled
    }

    pub async fn set_autosave_enabled(&mut self, enabled: bool) -> Result<()> {
        self.autosave_enabled = enabled;
        if !enabled {
            self.autosaver.cancel();
        }
        self.kv
            .put(AUTOSAVE_ENABLED_KEY, Value::Bool(enabled))
            .await
            .map_err(|e| self.report(e, "Nie udało się zapisać ustawienia auto-zapisu."))?;
        info!("Autosave {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Queues the state for a debounced write. Does nothing while autosave is
    /// disabled.
    pub fn trigger_autosave(&self, state: &CompetitionState) {
        if !self.autosave_enabled {
            return;
        }
        match serde_json::to_value(state) {
            Ok(snapshot) => self.autosaver.schedule(snapshot),
            Err(e) => {
                self.report(e, "Błąd auto-zapisu.");
            }
        }
    }

    pub async fn flush_autosave(&self) {
        self.autosaver.flush().await;
    }

    /// The stored autosave, if any. A record that no longer parses is treated
    /// as absent.
    pub async fn load_autosave(&self) -> Result<Option<CompetitionState>> {
        let Some(value) = self
            .kv
            .get(AUTOSAVE_KEY)
            .await
            .map_err(|e| self.report(e, "Nie udało się odczytać auto-zapisu."))?
        else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Ignoring unreadable autosave: {}", e);
                Ok(None)
            }
        }
    }

    /// Startup recovery. When an autosave exists the user is asked whether to
    /// restore it; accepting returns the state and keeps the record,
    /// declining deletes it.
    pub async fn recover_autosave(&self, confirmer: &dyn Confirmer) -> Result<Option<CompetitionState>> {
        let Some(state) = self.load_autosave().await? else {
            return Ok(None);
        };

        if confirmer.confirm(RESTORE_SESSION_PROMPT).await {
            self.notifier
                .notify("Sesja została przywrócona!", NotifyLevel::Success, None);
            info!("Restored autosaved session at event {}", state.event_number);
            Ok(Some(state))
        } else {
            self.clear_autosave().await?;
            Ok(None)
        }
    }

    pub async fn clear_autosave(&self) -> Result<()> {
        self.autosaver.cancel();
        self.kv
            .delete(AUTOSAVE_KEY)
            .await
            .map_err(|e| self.report(e, "Nie udało się usunąć auto-zapisu."))?;
        Ok(())
    }

    pub async fn save_checkpoint(&self, name: Option<String>, state: &CompetitionState) -> Result<CheckpointRecord> {
        let snapshot = serde_json::to_value(state)
            .map_err(|e| self.report(e, "Błąd zapisu punktu kontrolnego."))?;
        let record = CheckpointRecord::new(name, sanitize(&snapshot));

        self.checkpoints
            .put(record.clone())
            .await
            .map_err(|e| self.report(e, "Błąd zapisu punktu kontrolnego."))?;

        info!("Checkpoint '{}' saved as {}", record.name, record.key);
        self.notifier
            .notify("Punkt kontrolny zapisany.", NotifyLevel::Success, None);
        Ok(record)
    }

    /// Newest first.
    pub async fn list_checkpoints(&self) -> Result<Vec<CheckpointRecord>> {
        let mut records = self
            .checkpoints
            .get_all()
            .await
            .map_err(|e| self.report(e, "Błąd podczas pobierania punktów kontrolnych."))?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.key.cmp(&b.key)));
        Ok(records)
    }

    pub async fn load_checkpoint(&self, key: &str) -> Result<CompetitionState> {
        let record = self
            .checkpoints
            .get(&key.to_string())
            .await
            .map_err(|e| self.report(e, "Błąd przy wczytywaniu punktu kontrolnego."))?
            .ok_or_else(|| self.report(StorageError::NotFound, "Nie znaleziono punktu kontrolnego."))?;

        serde_json::from_value(record.state)
            .map_err(|e| self.report(e, "Błąd przy wczytywaniu punktu kontrolnego."))
    }

    pub async fn delete_checkpoint(&self, key: &str) -> Result<bool> {
        let removed = self
            .checkpoints
            .delete(&key.to_string())
            .await
            .map_err(|e| self.report(e, "Błąd usuwania punktu kontrolnego."))?;
        if removed {
            info!("Checkpoint {} deleted", key);
        }
        Ok(removed)
    }

    /// Pretty-printed state document.
    pub fn export_state(&self, state: &CompetitionState) -> Result<String> {
        Ok(serde_json::to_string_pretty(state)?)
    }

    /// Parses and validates a document. Nothing is restored here; the caller
    /// decides what to do with the returned state.
    pub fn import_state(&self, text: &str) -> Result<(CompetitionState, ValidationReport)> {
        let (state, report) = StateValidator::parse_document(text).map_err(|e| {
            warn!("Import rejected: {}", e);
            self.notifier
                .notify("Błąd przy imporcie pliku.", NotifyLevel::Error, None);
            PersistenceError::from(e)
        })?;
        report.log_warnings();
        Ok((state, report))
    }

    pub async fn save_theme(&self, theme: &str) -> Result<()> {
        self.kv
            .put(THEME_KEY, Value::String(theme.to_string()))
            .await
            .map_err(|e| self.report(e, "Nie udało się zapisać motywu."))?;
        Ok(())
    }

    pub async fn load_theme(&self) -> String {
        match self.kv.get(THEME_KEY).await {
            Ok(Some(Value::String(theme))) if !theme.is_empty() => theme,
            Ok(_) => DEFAULT_THEME.to_string(),
            Err(e) => {
                warn!("Could not read theme: {}", e);
                DEFAULT_THEME.to_string()
            }
        }
    }

    fn report(&self, err: impl Into<PersistenceError>, message: &str) -> PersistenceError {
        let err = err.into();
        error!("{}: {}", message, err);
        self.notifier.notify(message, NotifyLevel::Error, None);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{AutoConfirm, TracingNotifier};
    use storage::{MemoryRepository, MemoryStore};

    async fn coordinator(kv: Arc<MemoryStore>) -> PersistenceCoordinator {
        PersistenceCoordinator::new(
            kv,
            Arc::new(MemoryRepository::<CheckpointRecord>::new()),
            Arc::new(TracingNotifier),
            DEFAULT_AUTOSAVE_DELAY,
        )
        .await
    }

    fn started() -> CompetitionState {
        CompetitionState {
            competitors: vec!["A".to_string(), "B".to_string()],
            event_number: 3,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_accept_keeps_record() {
        let kv = Arc::new(MemoryStore::new());
        let persistence = coordinator(kv.clone()).await;
        persistence.trigger_autosave(&started());
        persistence.flush_autosave().await;

        let restored = persistence.recover_autosave(&AutoConfirm(true)).await.unwrap();
        assert_eq!(restored, Some(started()));
        assert!(kv.get(AUTOSAVE_KEY).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_decline_deletes_record() {
        let kv = Arc::new(MemoryStore::new());
        let persistence = coordinator(kv.clone()).await;
        persistence.trigger_autosave(&started());
        persistence.flush_autosave().await;

        assert!(persistence.recover_autosave(&AutoConfirm(false)).await.unwrap().is_none());
        assert!(kv.get(AUTOSAVE_KEY).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_autosave_persists_preference() {
        let kv = Arc::new(MemoryStore::new());
        let mut persistence = coordinator(kv.clone()).await;
        persistence.set_autosave_enabled(false).await.unwrap();
        persistence.trigger_autosave(&started());
        persistence.flush_autosave().await;
        assert!(kv.get(AUTOSAVE_KEY).await.unwrap().is_none());

        let reopened = coordinator(kv.clone()).await;
        assert!(!reopened.autosave_enabled());
    }

    #[tokio::test]
    async fn test_checkpoint_roundtrip_and_listing_order() {
        let persistence = coordinator(Arc::new(MemoryStore::new())).await;
        let first = persistence.save_checkpoint(Some("Po 1".to_string()), &started()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let mut later = started();
        later.event_number = 4;
        let second = persistence.save_checkpoint(None, &later).await.unwrap();

        let listed = persistence.list_checkpoints().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, second.key);
        assert!(second.name.starts_with("Checkpoint "));

        assert_eq!(persistence.load_checkpoint(&first.key).await.unwrap(), started());
        assert!(persistence.delete_checkpoint(&first.key).await.unwrap());
        assert!(matches!(
            persistence.load_checkpoint(&first.key).await.unwrap_err(),
            PersistenceError::Storage(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_import_rejects_missing_history() {
        let persistence = coordinator(Arc::new(MemoryStore::new())).await;
        let err = persistence
            .import_state(r#"{"competitors": ["A", "B"]}"#)
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Validation(_)));

        let exported = persistence.export_state(&started()).unwrap();
        let (state, _) = persistence.import_state(&exported).unwrap();
        assert_eq!(state, started());
    }

    #[tokio::test]
    async fn test_theme_defaults_to_light() {
        let persistence = coordinator(Arc::new(MemoryStore::new())).await;
        assert_eq!(persistence.load_theme().await, "light");
        persistence.save_theme("dark").await.unwrap();
        assert_eq!(persistence.load_theme().await, "dark");
    }
}
