pub mod config;
pub mod error;
pub mod history;
pub mod machine;
pub mod models;
pub mod notify;
pub mod persistence;
pub mod report;
pub mod scoring;
pub mod session;
pub mod standings;
pub mod tiebreak;
pub mod validator;

pub use config::CompetitionConfig;
pub use error::{CompetitionError, ParseError, PersistenceError, Result, ValidationError};
pub use history::History;
pub use machine::Competition;
pub use models::{CompetitionEvent, CompetitionState, EventResult, RawResult};
pub use notify::{AutoConfirm, Confirmer, NotifyLevel, Notifier, TracingNotifier};
pub use persistence::PersistenceCoordinator;
pub use report::ResultsReport;
pub use scoring::{PointsTable, ScoringEngine};
pub use session::Session;
pub use standings::{Standing, final_standings};
pub use tiebreak::{TieBreak, TieBreakReason, UNDECIDED_REASON, break_tie};
pub use validator::{StateValidator, ValidationReport};

pub use storage::models::Direction;
