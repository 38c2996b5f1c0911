//! Interactive scoring session on stdin/stdout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use competition::{Confirmer, Direction, RawResult, Session};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::Repository;
use storage::models::EventDefinition;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::render;

pub type Input = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> Input {
    Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()))
}

async fn read_line(input: &Input) -> Option<String> {
    input.lock().await.next_line().await.ok().flatten()
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

/// Asks on the terminal. End of input counts as "no".
pub struct ConsoleConfirmer {
    input: Input,
}

impl ConsoleConfirmer {
    pub fn new(input: Input) -> Self {
        Self { input }
    }
}

#[async_trait]
impl Confirmer for ConsoleConfirmer {
    async fn confirm(&self, message: &str) -> bool {
        prompt(&format!("{} [t/N] ", message));
        match read_line(&self.input).await {
            Some(answer) => matches!(
                answer.trim().to_lowercase().as_str(),
                "t" | "tak" | "y" | "yes"
            ),
            None => false,
        }
    }
}

pub const HELP: &str = "\
start A, B, C        rozpocznij zawody
type high|low        kierunek bieżącej konkurencji
title NAZWA          tytuł bieżącej konkurencji
select ID            konkurencja z bazy
meta NAZWA; MIEJSCE  nazwa i miejsce zawodów
logo DANE | nologo   ustaw / usuń logo
shuffle              losowa kolejność
score A=10; B=1:05,2 przyznaj punkty
edit NR A=11; B=9    popraw wyniki i przelicz
next | final         następna / finałowa konkurencja
undo | redo
show | events | standings
save [NAZWA] | checkpoints | load KLUCZ | delete KLUCZ
export PLIK | import PLIK
report [PLIK]        raport wyników (HTML)
autosave on|off | reset | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(Vec<String>),
    Type(Direction),
    Title(String),
    Select(i64),
    Meta { name: String, location: String },
    Logo(String),
    RemoveLogo,
    Shuffle,
    Score(Vec<RawResult>),
    Edit { nr: u32, results: Vec<RawResult> },
    Next,
    Final,
    Undo,
    Redo,
    Show,
    Events,
    Standings,
    Save(Option<String>),
    Checkpoints,
    Load(String),
    Delete(String),
    Export(PathBuf),
    Import(PathBuf),
    Report(Option<PathBuf>),
    Autosave(bool),
    Reset,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let require = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("Brak argumentu: {}", what))
        } else {
            Ok(rest.to_string())
        }
    };

    Ok(match word.to_lowercase().as_str() {
        "start" => Command::Start(split_list(rest, ',')),
        "type" => Command::Type(rest.parse()?),
        "title" => Command::Title(rest.to_string()),
        "select" => Command::Select(
            rest.parse()
                .map_err(|_| format!("Niepoprawny identyfikator: '{}'", rest))?,
        ),
        "meta" => {
            let (name, location) = rest.split_once(';').unwrap_or((rest, ""));
            Command::Meta {
                name: name.trim().to_string(),
                location: location.trim().to_string(),
            }
        }
        "logo" => Command::Logo(require("logo")?),
        "nologo" => Command::RemoveLogo,
        "shuffle" => Command::Shuffle,
        "score" => Command::Score(parse_results(rest)?),
        "edit" => {
            let (nr, results) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Command::Edit {
                nr: nr
                    .parse()
                    .map_err(|_| format!("Niepoprawny numer konkurencji: '{}'", nr))?,
                results: parse_results(results)?,
            }
        }
        "next" => Command::Next,
        "final" => Command::Final,
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "show" | "" => Command::Show,
        "events" => Command::Events,
        "standings" => Command::Standings,
        "save" => Command::Save(Some(rest.to_string()).filter(|n| !n.is_empty())),
        "checkpoints" => Command::Checkpoints,
        "load" => Command::Load(require("klucz")?),
        "delete" => Command::Delete(require("klucz")?),
        "export" => Command::Export(PathBuf::from(require("plik")?)),
        "import" => Command::Import(PathBuf::from(require("plik")?)),
        "report" => Command::Report(Some(rest).filter(|r| !r.is_empty()).map(PathBuf::from)),
        "autosave" => match rest {
            "on" => Command::Autosave(true),
            "off" => Command::Autosave(false),
            other => return Err(format!("Oczekiwano on/off, podano '{}'", other)),
        },
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Nieznane polecenie '{}'. Wpisz help.", other)),
    })
}

fn split_list(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `Anna=250; Bartek=1:05,2`. An empty value after `=` is a blank result.
/// Each name may appear once.
pub fn parse_results(text: &str) -> Result<Vec<RawResult>, String> {
    let mut seen = HashSet::new();
    split_list(text, ';')
        .into_iter()
        .map(|pair| {
            let (name, value) = pair
                .rsplit_once('=')
                .ok_or_else(|| format!("Oczekiwano ZAWODNIK=WYNIK, podano '{}'", pair))?;
            let name = name.trim();
            if !seen.insert(name.to_string()) {
                return Err(format!("Zawodnik '{}' podany więcej niż raz", name));
            }
            Ok(RawResult::new(name, value.trim()))
        })
        .collect()
}

/// Writes the state document into `dir` under a timestamped name.
pub async fn export_after_event(session: &Session, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Cannot create {}", dir.display()))?;
    let path = dir.join(format!(
        "strongman-state-{}.json",
        chrono::Utc::now().timestamp_millis()
    ));
    tokio::fs::write(&path, session.export_state()?)
        .await
        .with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(path)
}

pub fn report_timestamp() -> String {
    chrono::Local::now().format("%d.%m.%Y, %H:%M:%S").to_string()
}

pub async fn run(
    session: &mut Session,
    events: &dyn Repository<EventDefinition>,
    export_dir: Option<&Path>,
    input: Input,
) -> Result<()> {
    println!("{}", HELP);
    loop {
        prompt("> ");
        let Some(line) = read_line(&input).await else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(session, events, export_dir, command).await {
            println!("Błąd: {:#}", e);
        }
    }
    session.shutdown().await;
    Ok(())
}

async fn execute(
    session: &mut Session,
    events: &dyn Repository<EventDefinition>,
    export_dir: Option<&Path>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Start(names) => {
            if session.start_competition(names.as_slice()) {
                render::print_state(session.state());
            }
        }
        Command::Type(direction) => session.set_event_type(direction),
        Command::Title(title) => session.set_event_title(&title),
        Command::Select(id) => {
            let definition = events
                .get(&id)
                .await?
                .with_context(|| format!("Brak konkurencji {} w bazie", id))?;
            session.select_event(&definition);
            render::print_state(session.state());
        }
        Command::Meta { name, location } => session.set_metadata(&name, &location),
        Command::Logo(data) => session.set_logo(data),
        Command::RemoveLogo => {
            session.remove_logo().await;
        }
        Command::Shuffle => {
            session.shuffle();
            render::print_state(session.state());
        }
        Command::Score(results) => {
            session.finalize_event(&results)?;
            if let Some(event) = session.state().last_event() {
                render::print_event(event);
            }
            if let Some(dir) = export_dir {
                match export_after_event(session, dir).await {
                    Ok(path) => tracing::info!("State exported to {}", path.display()),
                    Err(e) => tracing::warn!("Automatic export failed: {:#}", e),
                }
            }
        }
        Command::Edit { nr, results } => {
            session.save_and_recalculate(nr, &results)?;
            render::print_standings(&session.standings());
        }
        Command::Next => {
            if session.next_event().await {
                render::print_state(session.state());
            }
        }
        Command::Final => {
            if session.prepare_final_event() {
                render::print_state(session.state());
            }
        }
        Command::Undo => {
            if !session.undo() {
                println!("Nie ma czego cofnąć.");
            }
        }
        Command::Redo => {
            if !session.redo() {
                println!("Nie ma czego ponowić.");
            }
        }
        Command::Show => render::print_state(session.state()),
        Command::Events => {
            for event in &session.state().event_history {
                render::print_event(event);
                println!();
            }
        }
        Command::Standings => render::print_standings(&session.standings()),
        Command::Save(name) => {
            let record = session.save_checkpoint(name).await?;
            println!("{}  {}", record.key, record.name);
        }
        Command::Checkpoints => render::print_checkpoints(&session.list_checkpoints().await?),
        Command::Load(key) => {
            if session.load_checkpoint(&key).await? {
                render::print_state(session.state());
            }
        }
        Command::Delete(key) => {
            session.delete_checkpoint(&key).await?;
        }
        Command::Export(path) => {
            let document = session.export_state()?;
            tokio::fs::write(&path, document)
                .await
                .with_context(|| format!("Cannot write {}", path.display()))?;
            println!("Zapisano {}", path.display());
        }
        Command::Import(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Cannot read {}", path.display()))?;
            if session.import_state(&text).await?.is_some() {
                render::print_state(session.state());
            }
        }
        Command::Report(path) => {
            let report = session.results_report(report_timestamp());
            let path = path.unwrap_or_else(|| PathBuf::from(report.file_name()));
            tokio::fs::write(&path, report.to_html())
                .await
                .with_context(|| format!("Cannot write {}", path.display()))?;
            println!("Zapisano raport {}", path.display());
        }
        Command::Autosave(enabled) => session.set_autosave_enabled(enabled).await?,
        Command::Reset => {
            session.reset().await?;
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_line() {
        let command = parse_command("score Anna Nowak=250; Bartek=1:05,2 ;Cezary=").unwrap();
        assert_eq!(
            command,
            Command::Score(vec![
                RawResult::new("Anna Nowak", "250"),
                RawResult::new("Bartek", "1:05,2"),
                RawResult::new("Cezary", ""),
            ])
        );
    }

    #[test]
    fn test_parse_start_and_edit() {
        assert_eq!(
            parse_command("start  Anna, Bartek ,, Cezary").unwrap(),
            Command::Start(vec!["Anna".into(), "Bartek".into(), "Cezary".into()])
        );
        assert_eq!(
            parse_command("edit 2 Anna=12").unwrap(),
            Command::Edit {
                nr: 2,
                results: vec![RawResult::new("Anna", "12")]
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("type sideways").is_err());
        assert!(parse_command("score Anna").is_err());
        assert!(parse_command("score Anna=10; Bartek=7; Anna=5").is_err());
        assert!(parse_command("load").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[tokio::test]
    async fn test_export_after_event_writes_state_document() {
        let config = competition::CompetitionConfig::default();
        let persistence = competition::PersistenceCoordinator::new(
            Arc::new(storage::MemoryStore::new()),
            Arc::new(storage::MemoryRepository::<storage::models::CheckpointRecord>::new()),
            Arc::new(competition::TracingNotifier),
            config.autosave_delay,
        )
        .await;
        let mut session = Session::new(
            &config,
            persistence,
            Arc::new(competition::TracingNotifier),
            Arc::new(competition::AutoConfirm(true)),
        );
        session.start_competition(&["Anna", "Bartek"]);
        session
            .finalize_event(&parse_results("Anna=10; Bartek=8").unwrap())
            .unwrap();

        let dir = std::env::temp_dir().join(format!("strongman-export-{}", std::process::id()));
        let path = export_after_event(&session, &dir).await.unwrap();
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let (state, report) = competition::StateValidator::parse_document(&text).unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(&state, session.state());
        assert_eq!(state.event_history.len(), 1);
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse_command("type time").unwrap(), Command::Type(Direction::Low));
        assert_eq!(
            parse_command("meta Puchar Bałtyku; Gdynia").unwrap(),
            Command::Meta {
                name: "Puchar Bałtyku".to_string(),
                location: "Gdynia".to_string()
            }
        );
        assert_eq!(parse_command("save").unwrap(), Command::Save(None));
        assert_eq!(parse_command("report").unwrap(), Command::Report(None));
        assert_eq!(
            parse_command("report wyniki.html").unwrap(),
            Command::Report(Some(PathBuf::from("wyniki.html")))
        );
        assert_eq!(parse_command("").unwrap(), Command::Show);
    }
}
