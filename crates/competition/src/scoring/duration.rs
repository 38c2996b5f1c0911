use rust_decimal::Decimal;
use std::str::FromStr;

const SECONDS_PER_MINUTE: i64 = 60;

/// Parses a typed result into a number.
///
/// Accepts plain decimals (`"250"`, `"12.5"`, `"12,5"`) and durations
/// `MM:SS` / `MM:SS.ss`, which become total seconds. Returns `None` when the
/// text is neither. Blank input is the caller's concern.
pub fn parse_value(raw: &str) -> Option<Decimal> {
    let text = raw.trim().replace(',', ".");
    if text.contains(':') {
        return parse_duration(&text);
    }
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(&text).ok()
}

/// `"1:05.00"` -> 65.00 seconds.
pub fn parse_duration(raw: &str) -> Option<Decimal> {
    let text = raw.trim().replace(',', ".");
    let (minutes, seconds) = text.split_once(':')?;

    if minutes.is_empty() || !minutes.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !seconds.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let minutes = Decimal::from_str(minutes).ok()?;
    let seconds = Decimal::from_str(seconds).ok()?;
    if seconds.is_sign_negative() || seconds >= Decimal::from(SECONDS_PER_MINUTE) {
        return None;
    }

    minutes
        .checked_mul(Decimal::from(SECONDS_PER_MINUTE))?
        .checked_add(seconds)
}

/// Renders seconds as `M:SS.ss`. Parsing the output gives back the same value
/// rounded to hundredths.
pub fn format_duration(total_seconds: Decimal) -> String {
    let total = total_seconds.abs().round_dp(2);
    let minute = Decimal::from(SECONDS_PER_MINUTE);
    let minutes = (total / minute).floor();
    let seconds = total - minutes * minute;

    let sign = if total_seconds.is_sign_negative() && !total.is_zero() {
        "-"
    } else {
        ""
    };
    let padding = if seconds < Decimal::from(10) { "0" } else { "" };
    format!("{}{}:{}{:.2}", sign, minutes, padding, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(parse_value("1:05.00"), Some(dec("65")));
        assert_eq!(parse_value("1:05"), Some(dec("65")));
        assert_eq!(parse_value("0:59.99"), Some(dec("59.99")));
        assert_eq!(parse_value("12:00,5"), Some(dec("720.5")));
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_value("65"), Some(dec("65")));
        assert_eq!(parse_value(" 250.5 "), Some(dec("250.5")));
        assert_eq!(parse_value("12,75"), Some(dec("12.75")));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value("1:75"), None);
        assert_eq!(parse_value(":30"), None);
        assert_eq!(parse_value("1:-5"), None);
        assert_eq!(parse_value("1:2:3"), None);
        assert_eq!(parse_value("."), None);
        assert_eq!(parse_value("10kg"), None);
        assert_eq!(parse_value("79228162514264337593543950335:00"), None);
        assert_eq!(parse_value("999999999999999999999999999999:00"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(dec("65")), "1:05.00");
        assert_eq!(format_duration(dec("59.999")), "1:00.00");
        assert_eq!(format_duration(dec("725.5")), "12:05.50");
        assert_eq!(format_duration(dec("9.1")), "0:09.10");
    }

    #[test]
    fn test_formatting_keeps_numeric_order() {
        let times = ["0:58.10", "1:05.00", "65.5", "2:00"];
        let parsed: Vec<Decimal> = times.iter().map(|t| parse_value(t).unwrap()).collect();

        for pair in parsed.windows(2) {
            let a = parse_value(&format_duration(pair[0])).unwrap();
            let b = parse_value(&format_duration(pair[1])).unwrap();
            assert!(a < b);
        }
    }
}
