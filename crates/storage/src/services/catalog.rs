use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::error::Result;
use crate::models::{Competitor, Direction, EventDefinition};
use crate::repository::{Record, Repository};

/// Outcome of a roster or catalog import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
}

/// Events offered when the catalog is empty.
pub const DEFAULT_EVENTS: &[(&str, Direction)] = &[
    ("Martwy ciąg", Direction::High),
    ("Wyciskanie belki", Direction::High),
    ("Spacer farmera", Direction::Low),
    ("Kamienie atlasa", Direction::Low),
    ("Przeciąganie ciężarówki", Direction::Low),
    ("Jarzmo", Direction::Low),
];

/// Merges competitors by name: existing names keep their id and get updated,
/// new names are added. Every entry is validated before anything is written.
pub async fn import_competitors(
    repo: &dyn Repository<Competitor>,
    incoming: Vec<Competitor>,
) -> Result<ImportSummary> {
    for competitor in &incoming {
        competitor.validate()?;
    }

    let existing = repo.get_all().await?;
    let mut summary = ImportSummary::default();

    for mut competitor in incoming {
        match existing.iter().find(|c| c.name == competitor.name) {
            Some(current) => {
                competitor.id = current.id;
                summary.updated += 1;
            }
            None => {
                competitor.id = None;
                summary.added += 1;
            }
        }
        repo.put(competitor).await?;
    }

    info!(
        "Roster import finished: {} added, {} updated",
        summary.added, summary.updated
    );
    Ok(summary)
}

/// Same merge rule as [`import_competitors`], keyed on event name.
pub async fn import_events(
    repo: &dyn Repository<EventDefinition>,
    incoming: Vec<EventDefinition>,
) -> Result<ImportSummary> {
    for event in &incoming {
        event.validate()?;
    }

    let existing = repo.get_all().await?;
    let mut summary = ImportSummary::default();

    for mut event in incoming {
        match existing.iter().find(|e| e.name == event.name) {
            Some(current) => {
                event.id = current.id;
                summary.updated += 1;
            }
            None => {
                event.id = None;
                summary.added += 1;
            }
        }
        repo.put(event).await?;
    }

    info!(
        "Event catalog import finished: {} added, {} updated",
        summary.added, summary.updated
    );
    Ok(summary)
}

/// Fills an empty catalog with [`DEFAULT_EVENTS`]. Returns how many were inserted.
pub async fn seed_events_if_empty(repo: &dyn Repository<EventDefinition>) -> Result<usize> {
    if repo.count().await? > 0 {
        return Ok(0);
    }

    for (name, direction) in DEFAULT_EVENTS {
        repo.put(EventDefinition::new(*name, *direction)).await?;
    }

    info!("Seeded event catalog with {} default events", DEFAULT_EVENTS.len());
    Ok(DEFAULT_EVENTS.len())
}

/// Roster sorted by name, as shown in selection lists, optionally narrowed to
/// one category.
pub async fn list_competitors(
    repo: &dyn Repository<Competitor>,
    category: Option<&str>,
) -> Result<Vec<Competitor>> {
    let mut competitors: Vec<Competitor> = repo
        .get_all()
        .await?
        .into_iter()
        .filter(|c| category.is_none_or(|cat| c.in_category(cat)))
        .collect();
    competitors.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(competitors)
}

pub async fn find_competitor(
    repo: &dyn Repository<Competitor>,
    name: &str,
) -> Result<Option<Competitor>> {
    Ok(repo.get_all().await?.into_iter().find(|c| c.name == name))
}

/// Distinct categories across the roster, sorted.
pub async fn categories(repo: &dyn Repository<Competitor>) -> Result<Vec<String>> {
    let mut all: Vec<String> = repo
        .get_all()
        .await?
        .into_iter()
        .flat_map(|c| c.categories)
        .collect();
    all.sort();
    all.dedup();
    Ok(all)
}

pub async fn export_json<T: Record>(repo: &dyn Repository<T>) -> Result<String> {
    let records = repo.get_all().await?;
    Ok(serde_json::to_string_pretty(&records)?)
}
