//! Command handlers a UI layer calls. Each handler runs one state-machine
//! operation, records the previous state for undo, and schedules an autosave.

use std::sync::Arc;
use storage::models::{CheckpointRecord, Direction, EventDefinition};
use tracing::info;

use crate::config::CompetitionConfig;
use crate::error::{CompetitionError, PersistenceError, Result};
use crate::history::History;
use crate::machine::Competition;
use crate::models::{CompetitionState, RawResult};
use crate::notify::{Confirmer, Notifier, NotifyLevel};
use crate::persistence::PersistenceCoordinator;
use crate::report::ResultsReport;
use crate::scoring::ScoringEngine;
use crate::standings::Standing;
use crate::validator::ValidationReport;

pub const UNSCORED_EVENT_PROMPT: &str =
    "Nie przyznano punktów dla bieżącej konkurencji. Czy na pewno chcesz kontynuować?";
pub const IMPORT_PROMPT: &str =
    "Czy na pewno chcesz zaimportować stan z pliku? Spowoduje to nadpisanie bieżącej sesji.";
pub const LOAD_CHECKPOINT_PROMPT: &str =
    "Czy wczytać punkt kontrolny? Bieżąca sesja zostanie nadpisana.";
pub const DELETE_CHECKPOINT_PROMPT: &str = "Na pewno usunąć punkt kontrolny?";
pub const RESET_PROMPT: &str = "Czy na pewno zresetować aplikację?";
pub const REMOVE_LOGO_PROMPT: &str = "Czy na pewno usunąć logo?";

const INVALID_RESULTS: &str =
    "Proszę wpisać prawidłowe wartości liczbowe lub użyć formatu MM:SS.ss dla czasu.";

pub struct Session {
    competition: Competition,
    history: History,
    persistence: PersistenceCoordinator,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
}

impl Session {
    pub fn new(
        config: &CompetitionConfig,
        persistence: PersistenceCoordinator,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            competition: Competition::new(ScoringEngine::new(config.points.clone())),
            history: History::new(config.history_depth),
            persistence,
            notifier,
            confirmer,
        }
    }

    pub fn state(&self) -> &CompetitionState {
        self.competition.state()
    }

    pub fn competition(&self) -> &Competition {
        &self.competition
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn persistence(&self) -> &PersistenceCoordinator {
        &self.persistence
    }

    pub fn standings(&self) -> Vec<Standing> {
        self.competition.standings()
    }

    pub fn results_report(&self, generated_at: impl Into<String>) -> ResultsReport {
        ResultsReport::new(self.competition.state(), generated_at)
    }

    /// Offers to restore an autosaved session. Returns whether one was
    /// restored.
    pub async fn recover_on_startup(&mut self) -> bool {
        match self.persistence.recover_autosave(self.confirmer.as_ref()).await {
            Ok(Some(state)) => {
                self.competition.restore_state(state);
                self.history.clear();
                true
            }
            Ok(None) => false,
            // Already reported by the coordinator.
            Err(_) => false,
        }
    }

    pub fn start_competition<S: AsRef<str>>(&mut self, names: &[S]) -> bool {
        let started = self.apply(|c| c.start_competition(names));
        if !started {
            self.notify("Wybierz co najmniej dwóch zawodników.", NotifyLevel::Error);
        }
        started
    }

    pub fn set_event_type(&mut self, direction: Direction) {
        self.apply(|c| {
            c.set_event_type(direction);
            true
        });
    }

    pub fn set_event_title(&mut self, title: &str) {
        self.apply(|c| {
            c.set_event_title(title);
            true
        });
    }

    pub fn select_event(&mut self, definition: &EventDefinition) {
        self.apply(|c| {
            c.select_event(definition);
            true
        });
    }

    pub fn set_metadata(&mut self, name: &str, location: &str) {
        self.apply(|c| {
            c.set_metadata(name, location);
            true
        });
    }

    pub fn set_logo(&mut self, logo: String) {
        self.apply(|c| {
            c.set_logo(Some(logo));
            true
        });
    }

    pub async fn remove_logo(&mut self) -> bool {
        if self.state().logo_data.is_none() || !self.confirmer.confirm(REMOVE_LOGO_PROMPT).await {
            return false;
        }
        self.apply(|c| {
            c.set_logo(None);
            true
        })
    }

    pub fn shuffle(&mut self) {
        self.apply(|c| {
            c.shuffle_competitors(&mut rand::thread_rng());
            true
        });
    }

    /// Scores the current event. A parse error is reported to the user and
    /// returned; nothing changes in that case.
    pub fn finalize_event(&mut self, raw_results: &[RawResult]) -> Result<()> {
        let name = self
            .try_apply(|c| c.finalize_event(raw_results).map(|e| e.name.clone()))
            .inspect_err(|e| match e {
                CompetitionError::Parse(_) => self.notify(INVALID_RESULTS, NotifyLevel::Error),
                other => self.notify(&other.to_string(), NotifyLevel::Error),
            })?;
        self.notify(
            &format!("Punkty dla \"{}\" zostały przyznane!", name),
            NotifyLevel::Success,
        );
        Ok(())
    }

    /// Advances to the next event, asking first when the current one has not
    /// been scored yet.
    pub async fn next_event(&mut self) -> bool {
        if self.state().is_started()
            && !self.state().current_event_scored()
            && !self.confirmer.confirm(UNSCORED_EVENT_PROMPT).await
        {
            return false;
        }
        self.apply(|c| {
            c.advance_to_next_event();
            true
        })
    }

    pub fn prepare_final_event(&mut self) -> bool {
        self.apply(Competition::prepare_final_event)
    }

    pub fn save_and_recalculate(&mut self, nr: u32, raw_results: &[RawResult]) -> Result<()> {
        self.try_apply(|c| c.edit_and_recalculate(nr, raw_results))
            .inspect_err(|e| match e {
                CompetitionError::Parse(_) => self.notify(INVALID_RESULTS, NotifyLevel::Error),
                other => self.notify(&other.to_string(), NotifyLevel::Error),
            })?;
        self.notify("Wyniki zostały przeliczone!", NotifyLevel::Success);
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.competition.state()) {
            Some(previous) => {
                self.competition.restore_state(previous);
                self.autosave();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.competition.state()) {
            Some(next) => {
                self.competition.restore_state(next);
                self.autosave();
                true
            }
            None => false,
        }
    }

    /// Replaces the session with an imported document after validation and
    /// confirmation. Undo history starts over. Returns `Ok(None)` when the
    /// user declined.
    pub async fn import_state(
        &mut self,
        text: &str,
    ) -> std::result::Result<Option<ValidationReport>, PersistenceError> {
        let (state, report) = self.persistence.import_state(text)?;
        if !self.confirmer.confirm(IMPORT_PROMPT).await {
            return Ok(None);
        }

        self.competition.restore_state(state);
        self.history.clear();
        self.autosave();
        info!("Imported state with {} event(s)", self.state().event_history.len());
        self.notify("Stan pomyślnie zaimportowano!", NotifyLevel::Success);
        Ok(Some(report))
    }

    pub fn export_state(&self) -> std::result::Result<String, PersistenceError> {
        self.persistence.export_state(self.competition.state())
    }

    pub async fn save_checkpoint(
        &self,
        name: Option<String>,
    ) -> std::result::Result<CheckpointRecord, PersistenceError> {
        self.persistence
            .save_checkpoint(name, self.competition.state())
            .await
    }

    pub async fn list_checkpoints(&self) -> std::result::Result<Vec<CheckpointRecord>, PersistenceError> {
        self.persistence.list_checkpoints().await
    }

    /// Restores a checkpoint and clears undo history. Returns `Ok(false)` when
    /// the user declined.
    pub async fn load_checkpoint(&mut self, key: &str) -> std::result::Result<bool, PersistenceError> {
        if !self.confirmer.confirm(LOAD_CHECKPOINT_PROMPT).await {
            return Ok(false);
        }
        let state = self.persistence.load_checkpoint(key).await?;
        self.competition.restore_state(state);
        self.history.clear();
        self.autosave();
        self.notify("Punkt kontrolny wczytany.", NotifyLevel::Success);
        Ok(true)
    }

    pub async fn delete_checkpoint(&self, key: &str) -> std::result::Result<bool, PersistenceError> {
        if !self.confirmer.confirm(DELETE_CHECKPOINT_PROMPT).await {
            return Ok(false);
        }
        let removed = self.persistence.delete_checkpoint(key).await?;
        if removed {
            self.notify("Usunięto punkt kontrolny.", NotifyLevel::Success);
        } else {
            self.notify("Nie znaleziono punktu kontrolnego.", NotifyLevel::Error);
        }
        Ok(removed)
    }

    /// Back to an empty competition. The autosave record is removed as well,
    /// so the next start does not offer to restore it.
    pub async fn reset(&mut self) -> std::result::Result<bool, PersistenceError> {
        if !self.confirmer.confirm(RESET_PROMPT).await {
            return Ok(false);
        }
        self.competition.reset();
        self.history.clear();
        self.persistence.clear_autosave().await?;
        self.notify("Aplikacja zresetowana.", NotifyLevel::Info);
        Ok(true)
    }

    pub async fn set_autosave_enabled(&mut self, enabled: bool) -> std::result::Result<(), PersistenceError> {
        self.persistence.set_autosave_enabled(enabled).await?;
        if enabled {
            self.autosave();
        }
        Ok(())
    }

    /// Writes any pending autosave before the session goes away.
    pub async fn shutdown(&self) {
        self.persistence.flush_autosave().await;
    }

    /// Runs an infallible operation. The previous state is recorded only when
    /// the operation reports success and actually changed something.
    fn apply<F>(&mut self, op: F) -> bool
    where
        F: FnOnce(&mut Competition) -> bool,
    {
        let before = self.competition.snapshot();
        let done = op(&mut self.competition);
        if done && *self.competition.state() != before {
            self.history.save_to_undo_history(&before);
            self.autosave();
        }
        done
    }

    fn try_apply<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Competition) -> Result<T>,
    {
        let before = self.competition.snapshot();
        let value = op(&mut self.competition)?;
        if *self.competition.state() != before {
            self.history.save_to_undo_history(&before);
            self.autosave();
        }
        Ok(value)
    }

    fn autosave(&self) {
        self.persistence.trigger_autosave(self.competition.state());
    }

    fn notify(&self, message: &str, level: NotifyLevel) {
        self.notifier.notify(message, level, None);
    }
}
