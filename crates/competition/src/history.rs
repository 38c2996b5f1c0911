use std::collections::VecDeque;
use tracing::debug;

use crate::models::CompetitionState;

pub const DEFAULT_HISTORY_DEPTH: usize = 200;

/// Undo/redo stacks of full state snapshots.
///
/// Snapshots are owned copies, so nothing pushed here can be changed through
/// the live state afterwards. When the undo stack grows past `depth` the
/// oldest snapshot is dropped.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<CompetitionState>,
    redo: Vec<CompetitionState>,
    depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Records `snapshot` as the newest undo point and forgets anything that
    /// could have been redone.
    pub fn save_to_undo_history(&mut self, snapshot: &CompetitionState) {
        self.redo.clear();
        self.push_undo(snapshot.clone());
    }

    /// Steps back. `current` goes onto the redo stack and the previous
    /// snapshot is returned; `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &CompetitionState) -> Option<CompetitionState> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.clone());
        debug!("Undo: {} left, {} redoable", self.undo.len(), self.redo.len());
        Some(previous)
    }

    pub fn redo(&mut self, current: &CompetitionState) -> Option<CompetitionState> {
        let next = self.redo.pop()?;
        self.push_undo(current.clone());
        debug!("Redo: {} left, {} undoable", self.redo.len(), self.undo.len());
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn push_undo(&mut self, snapshot: CompetitionState) {
        self.undo.push_back(snapshot);
        while self.undo.len() > self.depth {
            self.undo.pop_front();
        }
    }
}
