use anyhow::{Context, Result};
use competition::{CompetitionConfig, PointsTable};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    /// When set, the session writes the state document here after every
    /// scored event.
    pub export_dir: Option<PathBuf>,
    pub competition: CompetitionConfig,
}

impl Config {
    pub async fn from_env() -> Result<Self> {
        let mut competition = CompetitionConfig::default();

        if let Ok(delay) = std::env::var("STRONGMAN_AUTOSAVE_DELAY_MS") {
            let millis: u64 = delay
                .parse()
                .context("STRONGMAN_AUTOSAVE_DELAY_MS must be a number of milliseconds")?;
            competition.autosave_delay = Duration::from_millis(millis);
        }
        if let Ok(depth) = std::env::var("STRONGMAN_HISTORY_DEPTH") {
            competition.history_depth = depth
                .parse()
                .context("STRONGMAN_HISTORY_DEPTH must be a positive number")?;
        }
        if let Ok(path) = std::env::var("STRONGMAN_POINTS_TABLE") {
            competition.points = load_points_table(Path::new(&path)).await?;
        }

        Ok(Self {
            data_dir: std::env::var("STRONGMAN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
            export_dir: std::env::var("STRONGMAN_EXPORT_DIR").ok().map(PathBuf::from),
            competition,
        })
    }
}

pub async fn load_points_table(path: &Path) -> Result<PointsTable> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read points table {}", path.display()))?;
    let table: PointsTable = serde_json::from_str(&text)
        .with_context(|| format!("Invalid points table {}", path.display()))?;
    table.check().map_err(anyhow::Error::msg)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    async fn write_table(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "strongman-points-{}-{}.json",
            std::process::id(),
            contents.len()
        ));
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_points_table() {
        let path = write_table(r#"{"table": {"2": [5, 2]}}"#).await;

        let table = load_points_table(&path).await.unwrap();
        assert_eq!(table.points_for(2, 2), Decimal::from(2));
    }

    #[tokio::test]
    async fn test_increasing_row_rejected() {
        let path = write_table(r#"{"table": {"2": [1, 5], "3": [3, 2, 1]}}"#).await;

        assert!(load_points_table(&path).await.is_err());
    }
}
