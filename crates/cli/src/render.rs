use competition::scoring::format_duration;
use competition::{CompetitionEvent, CompetitionState, Direction, EventResult, Standing};
use rust_decimal::Decimal;
use storage::models::{CheckpointRecord, Competitor, EventDefinition};

pub fn points(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Raw result as typed, with the parsed time alongside for timed events.
fn result_cell(result: &EventResult, direction: Direction) -> String {
    match (direction, competition::scoring::parse_value(&result.result)) {
        (Direction::Low, Some(seconds)) if !result.result.contains(':') => {
            format!("{} ({})", result.result, format_duration(seconds))
        }
        _ => result.result.clone(),
    }
}

pub fn print_event(event: &CompetitionEvent) {
    println!("#{} {} [{}]", event.nr, event.name, event.direction);
    println!("{:<6} {:<28} {:>16} {:>8}", "Msc", "Zawodnik", "Wynik", "Pkt");
    let mut rows: Vec<&EventResult> = event.results.iter().collect();
    rows.sort_by_key(|r| r.place.unwrap_or(u32::MAX));
    for r in rows {
        println!(
            "{:<6} {:<28} {:>16} {:>8}",
            r.place.map(|p| p.to_string()).unwrap_or_default(),
            r.name,
            result_cell(r, event.direction),
            r.points.map(points).unwrap_or_default()
        );
    }
}

pub fn print_standings(standings: &[Standing]) {
    println!("Klasyfikacja Końcowa");
    println!("{:<6} {:<28} {:>8}", "Msc", "Zawodnik", "Suma");
    for s in standings {
        println!("{:<6} {:<28} {:>8}", s.place, s.name, points(s.score));
        if let Some(tie) = &s.tie_break {
            println!("       Wygrana przez: {}", tie.reason);
        }
    }
}

pub fn print_state(state: &CompetitionState) {
    if !state.event_name.is_empty() || !state.event_location.is_empty() {
        println!("{} {}", state.event_name, state.event_location);
    }
    println!(
        "Konkurencja {}: {} [{}]{}",
        state.event_number,
        state.event_title,
        state.current_event_type,
        if state.current_event_scored() { " (punkty przyznane)" } else { "" }
    );
    for (i, name) in state.competitors.iter().enumerate() {
        println!("{:>3}. {:<28} {:>8}", i + 1, name, points(state.score_of(name)));
    }
}

pub fn print_competitors(competitors: &[Competitor]) {
    for c in competitors {
        let categories: Vec<&str> = c.categories.iter().map(String::as_str).collect();
        println!(
            "{:>4}  {:<28} {}",
            c.id.map(|id| id.to_string()).unwrap_or_default(),
            c.name,
            categories.join(", ")
        );
    }
}

pub fn print_event_definitions(events: &[EventDefinition]) {
    for e in events {
        println!(
            "{:>4}  {:<32} {}",
            e.id.map(|id| id.to_string()).unwrap_or_default(),
            e.name,
            e.direction
        );
    }
}

pub fn print_checkpoints(checkpoints: &[CheckpointRecord]) {
    for cp in checkpoints {
        let local = cp.timestamp.with_timezone(&chrono::Local);
        println!("{}  {}  {}", cp.key, local.format("%Y-%m-%d %H:%M:%S"), cp.name);
    }
}
