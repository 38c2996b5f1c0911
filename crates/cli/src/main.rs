mod config;
mod console;
mod render;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use competition::{
    AutoConfirm, Confirmer, Direction, Notifier, PersistenceCoordinator, PersistenceError,
    ResultsReport, ScoringEngine, Session, StateValidator, TracingNotifier, final_standings,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::models::{CheckpointRecord, Competitor, EventDefinition};
use storage::services::catalog;
use storage::{JsonFileRepository, JsonFileStore, Repository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, load_points_table};

#[derive(Parser)]
#[command(name = "strongman")]
#[command(about = "Strongman competition scorekeeper", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "STRONGMAN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single event from NAME=RESULT pairs
    Score {
        #[arg(short, long, default_value = "high")]
        direction: Direction,

        #[arg(long)]
        competitors: Option<usize>,

        /// JSON points table; overrides STRONGMAN_POINTS_TABLE
        #[arg(long)]
        points: Option<PathBuf>,

        #[arg(required = true)]
        results: Vec<String>,
    },
    /// Final classification of an exported state document
    Standings { file: PathBuf },
    /// Check an exported state document without importing it
    Validate { file: PathBuf },
    /// Printable HTML results of an exported state document
    Report {
        file: PathBuf,

        /// Defaults to wyniki_<event name>.html
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Competitor roster
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },
    /// Event catalog
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },
    /// Saved checkpoints
    Checkpoints {
        #[command(subcommand)]
        action: CheckpointAction,
    },
    /// Interactive scoring session
    Session {
        /// Answer every confirmation with yes
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RosterAction {
    List {
        /// Only competitors tagged with this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Categories used across the roster
    Categories,
    Show { name: String },
    Add {
        name: String,

        #[arg(short, long)]
        category: Vec<String>,
    },
    Remove { id: i64 },
    Import { file: PathBuf },
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum EventsAction {
    List,
    Add {
        name: String,

        #[arg(short, long, default_value = "high")]
        direction: Direction,
    },
    Remove { id: i64 },
    Import { file: PathBuf },
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add the default events when the catalog is empty
    Seed,
}

#[derive(Subcommand)]
enum CheckpointAction {
    List,
    Show { key: String },
    Delete { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "strongman={},competition={},storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env().await?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Score {
            direction,
            competitors,
            points,
            results,
        } => handle_score(&config, direction, competitors, points, &results).await?,
        Commands::Standings { file } => handle_standings(&file).await?,
        Commands::Validate { file } => handle_validate(&file).await?,
        Commands::Report { file, output } => handle_report(&file, output).await?,
        Commands::Roster { action } => handle_roster(&config, action).await?,
        Commands::Events { action } => handle_events(&config, action).await?,
        Commands::Checkpoints { action } => handle_checkpoints(&config, action).await?,
        Commands::Session { yes } => handle_session(&config, yes).await?,
    }

    Ok(())
}

async fn handle_score(
    config: &Config,
    direction: Direction,
    competitors: Option<usize>,
    points: Option<PathBuf>,
    results: &[String],
) -> Result<()> {
    let table = match points {
        Some(path) => load_points_table(&path).await?,
        None => config.competition.points.clone(),
    };
    let raw = console::parse_results(&results.join(";")).map_err(anyhow::Error::msg)?;
    let engine = ScoringEngine::new(table);
    let scored = engine.compute_event_points(&raw, competitors.unwrap_or(raw.len()), direction)?;

    render::print_event(&competition::CompetitionEvent {
        nr: 1,
        name: "Wyniki".to_string(),
        direction,
        results: scored,
    });
    Ok(())
}

async fn read_file(file: &Path) -> Result<String> {
    tracing::info!("Loading {}", file.display());
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Cannot read {}", file.display()))
}

async fn handle_standings(file: &Path) -> Result<()> {
    let (state, report) = StateValidator::parse_document(&read_file(file).await?)?;
    report.log_warnings();
    render::print_standings(&final_standings(&state));
    Ok(())
}

async fn handle_validate(file: &Path) -> Result<()> {
    let (state, report) = StateValidator::parse_document(&read_file(file).await?)?;
    report.log_warnings();
    tracing::info!(
        "✓ Validation successful: {} competitors, {} events, {} warning(s)",
        state.competitors.len(),
        state.event_history.len(),
        report.warnings.len()
    );
    Ok(())
}

async fn handle_report(file: &Path, output: Option<PathBuf>) -> Result<()> {
    let (state, report) = StateValidator::parse_document(&read_file(file).await?)?;
    report.log_warnings();

    let results = ResultsReport::new(&state, console::report_timestamp());
    let path = output.unwrap_or_else(|| PathBuf::from(results.file_name()));
    tokio::fs::write(&path, results.to_html())
        .await
        .with_context(|| format!("Cannot write {}", path.display()))?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}

async fn write_or_print(output: Option<PathBuf>, json: String) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Cannot write {}", path.display()))?;
            tracing::info!("Exported to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn handle_roster(config: &Config, action: RosterAction) -> Result<()> {
    let repo = JsonFileRepository::<Competitor>::new(&config.data_dir);

    match action {
        RosterAction::List { category } => render::print_competitors(
            &catalog::list_competitors(&repo, category.as_deref()).await?,
        ),
        RosterAction::Categories => {
            for category in catalog::categories(&repo).await? {
                println!("{}", category);
            }
        }
        RosterAction::Show { name } => match catalog::find_competitor(&repo, name.trim()).await? {
            Some(competitor) => render::print_competitors(&[competitor]),
            None => bail!("Competitor {} not found", name.trim()),
        },
        RosterAction::Add { name, category } => {
            let competitor = Competitor::new(name.trim()).with_categories(category);
            let id = match repo.put(competitor).await {
                Err(e) if e.is_unique_violation() => {
                    bail!("Competitor {} already exists", name.trim())
                }
                other => other?,
            };
            tracing::info!("Added competitor {} ({})", name.trim(), id);
        }
        RosterAction::Remove { id } => {
            if !repo.delete(&id).await? {
                bail!("Competitor {} not found", id);
            }
            tracing::info!("Removed competitor {}", id);
        }
        RosterAction::Import { file } => {
            let text = read_file(&file).await?;
            let incoming: Vec<Competitor> =
                serde_json::from_str(&text).context("Roster file must be a JSON list of competitors")?;
            let summary = catalog::import_competitors(&repo, incoming).await?;
            println!("Dodano: {}, zaktualizowano: {}", summary.added, summary.updated);
        }
        RosterAction::Export { output } => {
            write_or_print(output, catalog::export_json(&repo).await?).await?
        }
    }
    Ok(())
}

async fn handle_events(config: &Config, action: EventsAction) -> Result<()> {
    let repo = JsonFileRepository::<EventDefinition>::new(&config.data_dir);

    match action {
        EventsAction::List => {
            let mut events = repo.get_all().await?;
            events.sort_by(|a, b| a.name.cmp(&b.name));
            render::print_event_definitions(&events);
        }
        EventsAction::Add { name, direction } => {
            let id = repo.put(EventDefinition::new(name.trim(), direction)).await?;
            tracing::info!("Added event {} ({})", name.trim(), id);
        }
        EventsAction::Remove { id } => {
            if !repo.delete(&id).await? {
                bail!("Event {} not found", id);
            }
            tracing::info!("Removed event {}", id);
        }
        EventsAction::Import { file } => {
            let text = read_file(&file).await?;
            let incoming: Vec<EventDefinition> =
                serde_json::from_str(&text).context("Event file must be a JSON list of events")?;
            let summary = catalog::import_events(&repo, incoming).await?;
            println!("Dodano: {}, zaktualizowano: {}", summary.added, summary.updated);
        }
        EventsAction::Export { output } => {
            write_or_print(output, catalog::export_json(&repo).await?).await?
        }
        EventsAction::Seed => {
            let added = catalog::seed_events_if_empty(&repo).await?;
            println!("Dodano {} konkurencji", added);
        }
    }
    Ok(())
}

async fn handle_checkpoints(config: &Config, action: CheckpointAction) -> Result<()> {
    let persistence = coordinator(config, Arc::new(TracingNotifier)).await;

    match action {
        CheckpointAction::List => render::print_checkpoints(&persistence.list_checkpoints().await?),
        CheckpointAction::Show { key } => {
            let state = match persistence.load_checkpoint(&key).await {
                Err(PersistenceError::Storage(e)) if e.is_not_found() => {
                    bail!("Checkpoint {} not found", key)
                }
                other => other?,
            };
            render::print_state(&state);
            render::print_standings(&final_standings(&state));
        }
        CheckpointAction::Delete { key } => {
            if !persistence.delete_checkpoint(&key).await? {
                bail!("Checkpoint {} not found", key);
            }
        }
    }
    Ok(())
}

async fn coordinator(config: &Config, notifier: Arc<dyn Notifier>) -> PersistenceCoordinator {
    PersistenceCoordinator::new(
        Arc::new(JsonFileStore::new(&config.data_dir)),
        Arc::new(JsonFileRepository::<CheckpointRecord>::new(&config.data_dir)),
        notifier,
        config.competition.autosave_delay,
    )
    .await
}

async fn handle_session(config: &Config, yes: bool) -> Result<()> {
    tracing::info!("Using data directory {}", config.data_dir.display());
    let events = JsonFileRepository::<EventDefinition>::new(&config.data_dir);
    catalog::seed_events_if_empty(&events).await?;

    let input = console::stdin_lines();
    let confirmer: Arc<dyn Confirmer> = if yes {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(console::ConsoleConfirmer::new(input.clone()))
    };
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    let persistence = coordinator(config, notifier.clone()).await;
    let mut session = Session::new(&config.competition, persistence, notifier, confirmer);
    if session.recover_on_startup().await {
        render::print_state(session.state());
    }

    console::run(&mut session, &events, config.export_dir.as_deref(), input).await
}
