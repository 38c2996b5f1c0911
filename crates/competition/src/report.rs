//! Printable results: the final classification followed by every scored
//! event, ready to be saved as a standalone HTML page.

use serde::Serialize;
use std::fmt;
use storage::models::Direction;

use crate::models::{CompetitionState, EventResult};
use crate::standings::{Standing, final_standings};

pub const DEFAULT_REPORT_TITLE: &str = "Zawody Strongman";

const STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.4; margin: 20px; color: #333; }
.container { max-width: 800px; margin: auto; }
.header { text-align: center; margin-bottom: 30px; }
.logo { max-height: 100px; margin-bottom: 15px; }
table { border-collapse: collapse; width: 100%; margin-bottom: 25px; font-size: 10pt; }
th, td { border: 1px solid #ccc; padding: 8px; text-align: center; }
th { background-color: #f2f2f2; font-weight: bold; }
td:nth-child(2) { text-align: left; }
h1, h2, h3 { text-align: center; }
h4 { text-align: left; margin-top: 25px; margin-bottom: 10px; }";

pub fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::High => "Więcej = lepiej",
        Direction::Low => "Mniej = lepiej",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEvent {
    pub nr: u32,
    pub name: String,
    pub direction: Direction,
    /// Sorted by place, unplaced rows last.
    pub results: Vec<EventResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsReport {
    pub event_name: String,
    pub location: String,
    pub generated_at: String,
    pub logo_data: Option<String>,
    pub standings: Vec<Standing>,
    pub events: Vec<ReportEvent>,
}

impl ResultsReport {
    pub fn new(state: &CompetitionState, generated_at: impl Into<String>) -> Self {
        let events = state
            .event_history
            .iter()
            .map(|event| {
                let mut results = event.results.clone();
                results.sort_by_key(|r| r.place.unwrap_or(u32::MAX));
                ReportEvent {
                    nr: event.nr,
                    name: event.name.clone(),
                    direction: event.direction,
                    results,
                }
            })
            .collect();

        Self {
            event_name: state.event_name.clone(),
            location: state.event_location.clone(),
            generated_at: generated_at.into(),
            logo_data: state.logo_data.clone(),
            standings: final_standings(state),
            events,
        }
    }

    pub fn title(&self) -> &str {
        if self.event_name.trim().is_empty() {
            DEFAULT_REPORT_TITLE
        } else {
            &self.event_name
        }
    }

    /// `wyniki_<event name>.html`, with whitespace and slashes replaced.
    pub fn file_name(&self) -> String {
        let name = if self.event_name.trim().is_empty() {
            "zawody".to_string()
        } else {
            self.event_name
                .chars()
                .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
                .collect()
        };
        format!("wyniki_{}.html", name)
    }

    pub fn to_html(&self) -> String {
        self.to_string()
    }

    fn write_standings(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<h3>Klasyfikacja Końcowa</h3>")?;
        writeln!(f, "<table>")?;
        writeln!(
            f,
            "<thead><tr><th>M-ce</th><th>Zawodnik</th><th>Suma pkt.</th><th>Uwagi</th></tr></thead>"
        )?;
        writeln!(f, "<tbody>")?;
        for standing in &self.standings {
            let note = standing
                .tie_break
                .as_ref()
                .map(|tie| format!("Wygrana przez: {}", tie.reason))
                .unwrap_or_default();
            writeln!(
                f,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                standing.place,
                escape(&standing.name),
                standing.score.normalize(),
                escape(&note)
            )?;
        }
        writeln!(f, "</tbody>\n</table>")
    }

    fn write_event(event: &ReportEvent, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "<h4>{}. {} ({})</h4>",
            event.nr,
            escape(&event.name),
            direction_label(event.direction)
        )?;
        writeln!(f, "<table>")?;
        writeln!(
            f,
            "<thead><tr><th>M-ce</th><th>Zawodnik</th><th>Wynik</th><th>Pkt.</th></tr></thead>"
        )?;
        writeln!(f, "<tbody>")?;
        for result in &event.results {
            let cell = if result.result.is_empty() { "-" } else { result.result.as_str() };
            writeln!(
                f,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                result.place.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                escape(&result.name),
                escape(cell),
                result
                    .points
                    .map(|p| p.normalize().to_string())
                    .unwrap_or_else(|| "-".to_string())
            )?;
        }
        writeln!(f, "</tbody>\n</table>")
    }
}

impl fmt::Display for ResultsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html lang=\"pl\">")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"UTF-8\">")?;
        writeln!(f, "<title>Wyniki: {}</title>", escape(self.title()))?;
        writeln!(f, "<style>\n{}\n</style>", STYLE)?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body><div class=\"container\">")?;

        writeln!(f, "<div class=\"header\">")?;
        if let Some(logo) = &self.logo_data {
            writeln!(f, "<img src=\"{}\" class=\"logo\">", escape(logo))?;
        }
        writeln!(f, "<h1>{}</h1>", escape(self.title()))?;
        if !self.location.is_empty() {
            writeln!(f, "<h2>{}</h2>", escape(&self.location))?;
        }
        writeln!(f, "<p>Data wygenerowania: {}</p>", escape(&self.generated_at))?;
        writeln!(f, "</div>")?;

        self.write_standings(f)?;
        writeln!(f, "<h3>Szczegółowe Wyniki Konkurencji</h3>")?;
        for event in &self.events {
            Self::write_event(event, f)?;
        }
        writeln!(f, "</div></body>\n</html>")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
