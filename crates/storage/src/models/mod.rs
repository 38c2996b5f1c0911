pub(crate) mod checkpoint;
mod competitor;
mod direction;
mod event_definition;
mod serde_helpers;

pub use checkpoint::CheckpointRecord;
pub use competitor::Competitor;
pub use direction::Direction;
pub use event_definition::EventDefinition;
