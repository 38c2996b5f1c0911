use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use storage::models::{Direction, EventDefinition};
use tracing::{debug, info};

use crate::error::{CompetitionError, ParseError, Result};
use crate::models::{CompetitionEvent, CompetitionState, EventResult, RawResult, default_event_title};
use crate::scoring::ScoringEngine;
use crate::standings::{Standing, final_standings};
use crate::tiebreak::{TieBreak, break_tie};

pub const FINAL_EVENT_TITLE: &str = "Finał";

/// Owner of the live competition state. Every change goes through one of the
/// operations below, which keep the cumulative scores equal to the sum of the
/// recorded event points.
#[derive(Debug, Clone, Default)]
pub struct Competition {
    state: CompetitionState,
    engine: ScoringEngine,
}

impl Competition {
    pub fn new(engine: ScoringEngine) -> Self {
        Self {
            state: CompetitionState::default(),
            engine,
        }
    }

    pub fn with_state(engine: ScoringEngine, state: CompetitionState) -> Self {
        Self { state, engine }
    }

    pub fn state(&self) -> &CompetitionState {
        &self.state
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Owned copy of the current state, for history and persistence.
    pub fn snapshot(&self) -> CompetitionState {
        self.state.clone()
    }

    /// Starts over with the given roster. Blank and repeated names are
    /// ignored; with fewer than two names left nothing changes and `false`
    /// is returned.
    pub fn start_competition<I, S>(&mut self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let roster: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty() && seen.insert(n.clone()))
            .collect();

        if roster.len() < 2 {
            debug!("Refusing to start with {} competitor(s)", roster.len());
            return false;
        }

        self.state.scores = roster.iter().map(|n| (n.clone(), Decimal::ZERO)).collect();
        self.state.competitors = roster;
        self.state.event_number = 1;
        self.state.event_history.clear();
        self.state.event_title = default_event_title(1);
        info!("Competition started with {} competitors", self.state.competitors.len());
        true
    }

    pub fn set_event_type(&mut self, direction: Direction) {
        self.state.current_event_type = direction;
    }

    /// Blank titles fall back to the numbered default.
    pub fn set_event_title(&mut self, title: &str) {
        let title = title.trim();
        self.state.event_title = if title.is_empty() {
            default_event_title(self.state.event_number)
        } else {
            title.to_string()
        };
    }

    /// Takes title and direction from a catalog entry.
    pub fn select_event(&mut self, definition: &EventDefinition) {
        self.set_event_title(&definition.name);
        self.state.current_event_type = definition.direction;
    }

    pub fn set_metadata(&mut self, name: &str, location: &str) {
        self.state.event_name = name.trim().to_string();
        self.state.event_location = location.trim().to_string();
    }

    pub fn set_logo(&mut self, logo: Option<String>) {
        self.state.logo_data = logo.filter(|l| !l.trim().is_empty());
    }

    /// Scores the current event and appends it to the history.
    ///
    /// On a parse error or a repeated name nothing changes. Active
    /// competitors missing from the input are scored as blank. Points are
    /// added only for names that have a score entry, so results for people
    /// outside the roster are kept in the event but do not create new totals.
    pub fn finalize_event(&mut self, raw_results: &[RawResult]) -> Result<&CompetitionEvent> {
        if !self.state.is_started() {
            return Err(CompetitionError::NotStarted);
        }
        if self.state.current_event_scored() {
            return Err(CompetitionError::EventAlreadyScored(self.state.event_number));
        }

        let rows = self.event_rows(raw_results)?;
        let results = self.engine.compute_event_points(
            &rows,
            self.state.competitors.len(),
            self.state.current_event_type,
        )?;

        for result in &results {
            if let Some(score) = self.state.scores.get_mut(&result.name) {
                *score += result.points.unwrap_or_default();
            }
        }

        let event = CompetitionEvent {
            nr: self.state.event_number,
            name: self.state.event_title.clone(),
            direction: self.state.current_event_type,
            results,
        };
        info!("Event {} '{}' scored", event.nr, event.name);
        self.state.event_history.push(event);

        self.state
            .event_history
            .last()
            .ok_or(CompetitionError::EventNotFound(self.state.event_number))
    }

    /// One row per active competitor in roster order, blank when no result
    /// was given, followed by rows for names outside the roster.
    fn event_rows(&self, raw_results: &[RawResult]) -> Result<Vec<RawResult>> {
        let mut given: BTreeMap<&str, &RawResult> = BTreeMap::new();
        for raw in raw_results {
            let name = raw.name.trim();
            if given.insert(name, raw).is_some() {
                return Err(CompetitionError::DuplicateResult(name.to_string()));
            }
        }

        let mut rows: Vec<RawResult> = self
            .state
            .competitors
            .iter()
            .map(|name| match given.remove(name.as_str()) {
                Some(raw) => RawResult::new(name.as_str(), raw.result.as_str()),
                None => RawResult::new(name.as_str(), ""),
            })
            .collect();
        rows.extend(
            raw_results
                .iter()
                .filter(|raw| given.contains_key(raw.name.trim()))
                .map(|raw| RawResult::new(raw.name.trim(), raw.result.as_str())),
        );
        Ok(rows)
    }

    /// Moves to the next event. The roster is reordered by the points of the
    /// last recorded event, lowest first; equal points keep their order.
    pub fn advance_to_next_event(&mut self) {
        self.state.event_number += 1;
        self.state.event_title = default_event_title(self.state.event_number);

        if let Some(last) = self.state.event_history.last() {
            let last_points: BTreeMap<&str, Decimal> = last
                .results
                .iter()
                .map(|r| (r.name.as_str(), r.points.unwrap_or_default()))
                .collect();
            let points = |name: &str| last_points.get(name).copied().unwrap_or_default();

            let mut order = std::mem::take(&mut self.state.competitors);
            order.sort_by(|a, b| points(a.as_str()).cmp(&points(b.as_str())));
            self.state.competitors = order;
        }
        info!("Advanced to event {}", self.state.event_number);
    }

    /// Orders the roster for the closing event: reverse of the current
    /// standings, so the leader goes last.
    pub fn prepare_final_event(&mut self) -> bool {
        if !self.state.is_started() {
            return false;
        }
        let mut order: Vec<String> = self.standings().into_iter().map(|s| s.name).collect();
        order.reverse();
        self.state.competitors = order;
        self.state.event_title = FINAL_EVENT_TITLE.to_string();
        info!("Final event prepared for {} competitors", self.state.competitors.len());
        true
    }

    pub fn shuffle_competitors<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.state.competitors.shuffle(rng);
    }

    /// Replaces raw result text in a recorded event. Names not present in the
    /// event are ignored. Points are left alone until a recalculation.
    pub fn edit_event_results(&mut self, nr: u32, new_results: &[RawResult]) -> Result<()> {
        let event = self
            .state
            .event_history
            .iter_mut()
            .find(|e| e.nr == nr)
            .ok_or(CompetitionError::EventNotFound(nr))?;

        for result in &mut event.results {
            if let Some(raw) = new_results.iter().find(|r| r.name == result.name) {
                result.result = raw.result.trim().to_string();
            }
        }
        Ok(())
    }

    pub fn recalculate_all(&mut self) -> Result<()> {
        let engine = self.engine.clone();
        self.recalculate_all_with(|raw, count, direction| {
            engine.compute_event_points(raw, count, direction)
        })
    }

    /// Rescores every recorded event from its raw results and rebuilds the
    /// totals from scratch. If any event fails to parse, the state is left
    /// as it was.
    pub fn recalculate_all_with<F>(&mut self, score: F) -> Result<()>
    where
        F: Fn(&[RawResult], usize, Direction) -> std::result::Result<Vec<EventResult>, ParseError>,
    {
        let count = self.state.competitors.len();
        let rescored = self
            .state
            .event_history
            .iter()
            .map(|event| score(&event.raw_results(), count, event.direction))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (event, results) in self.state.event_history.iter_mut().zip(rescored) {
            for original in &mut event.results {
                if let Some(fresh) = results.iter().find(|r| r.name == original.name) {
                    original.place = fresh.place;
                    original.points = fresh.points;
                }
            }
        }

        let totals: Vec<(String, Decimal)> = self
            .state
            .scores
            .keys()
            .map(|name| (name.clone(), self.state.history_total(name)))
            .collect();
        self.state.scores.extend(totals);
        debug!("Recalculated {} event(s)", self.state.event_history.len());
        Ok(())
    }

    /// Edits one event and rescores everything, or changes nothing at all.
    pub fn edit_and_recalculate(&mut self, nr: u32, new_results: &[RawResult]) -> Result<()> {
        let before = self.state.clone();
        let outcome = self
            .edit_event_results(nr, new_results)
            .and_then(|_| self.recalculate_all());
        if outcome.is_err() {
            self.state = before;
        }
        outcome
    }

    /// Wholesale replacement. Callers loading untrusted documents validate
    /// them first.
    pub fn restore_state(&mut self, state: CompetitionState) {
        self.state = state;
    }

    pub fn reset(&mut self) {
        self.state = CompetitionState::default();
        info!("Competition reset");
    }

    pub fn standings(&self) -> Vec<Standing> {
        final_standings(&self.state)
    }

    pub fn break_tie(&self, a: &str, b: &str) -> TieBreak {
        break_tie(a, b, &self.state.event_history)
    }
}
