use thiserror::Error;

pub type Result<T, E = CompetitionError> = std::result::Result<T, E>;

/// A raw result that is neither a number nor a `MM:SS.ss` duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid result '{raw}' for {name}: expected a number or MM:SS.ss")]
pub struct ParseError {
    pub name: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompetitionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Competition has not been started")]
    NotStarted,

    #[error("At least two competitors are required, got {0}")]
    NotEnoughCompetitors(usize),

    #[error("Event {0} has already been scored")]
    EventAlreadyScored(u32),

    #[error("Event {0} not found")]
    EventNotFound(u32),

    #[error("More than one result given for {0}")]
    DuplicateResult(String),
}

/// Rejected import document. Raised before any state is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Document is not a JSON object")]
    NotAnObject,

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Validation failed with {} error(s): {}", .0.len(), .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
