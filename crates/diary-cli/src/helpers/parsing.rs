//! Parsing helpers for datetimes, durations, field values and block specs.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use diary_core::blocks::{Block, BlockType};

use crate::errors::CliError;

/// Parse a datetime string (ISO-8601 or YYYY-MM-DD).
pub fn parse_datetime(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| CliError::invalid_input(format!("Invalid date value: {}", value)))?;
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    Err(CliError::invalid_input(format!(
        "Invalid date/time (expected ISO-8601 or YYYY-MM-DD): {}",
        value
    ))
    .into())
}

/// Parse a duration string (e.g., "7d", "24h").
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let invalid = |message: String| -> anyhow::Error { CliError::invalid_input(message).into() };
    if value.len() < 2 || !value.is_ascii() {
        return Err(invalid(format!(
            "Invalid duration: {} (expected <number><unit>)",
            value
        )));
    }

    let (num_str, unit) = value.split_at(value.len() - 1);
    let amount: i64 = num_str
        .parse()
        .map_err(|_| invalid(format!("Invalid duration number: {}", value)))?;
    if amount <= 0 {
        return Err(invalid(format!("Duration must be positive: {}", value)));
    }

    match unit {
        "d" => Ok(Duration::days(amount)),
        "h" => Ok(Duration::hours(amount)),
        "m" => Ok(Duration::minutes(amount)),
        "s" => Ok(Duration::seconds(amount)),
        _ => Err(invalid(format!(
            "Invalid duration unit: {} (use d/h/m/s)",
            unit
        ))),
    }
}

/// Split `LABEL=VALUE` at the first `=`.
pub fn parse_value_pair(value: &str) -> anyhow::Result<(String, String)> {
    match value.split_once('=') {
        Some((label, raw)) if !label.trim().is_empty() => {
            Ok((label.trim().to_string(), raw.to_string()))
        }
        _ => Err(CliError::invalid_input(format!(
            "Invalid --value \"{}\" (expected LABEL=VALUE)",
            value
        ))
        .into()),
    }
}

/// Parse a block spec `TYPE:LABEL[:OPTIONS]`.
///
/// OPTIONS is a comma-separated choice list for `multiselect` and
/// `MIN-MAX[/STEP]` for `slider`.
pub fn parse_block_spec(spec: &str) -> anyhow::Result<Block> {
    let mut parts = spec.splitn(3, ':');
    let kind: BlockType = parts.next().unwrap_or_default().parse()?;
    let label = parts.next().map(str::trim).unwrap_or_default();
    if label.is_empty() {
        return Err(CliError::invalid_input(format!(
            "Block \"{}\" has no label (expected TYPE:LABEL[:OPTIONS])",
            spec
        ))
        .into());
    }
    let block = Block::new(kind, label);
    let options = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match (kind, options) {
        (BlockType::Multiselect, Some(options)) => Ok(block.with_choices(
            options
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        (BlockType::Slider, Some(options)) => {
            let (range, step) = options.split_once('/').unwrap_or((options, "1"));
            let bad = || CliError::invalid_input(format!("Invalid slider range \"{}\"", options));
            let (min, max) = range.split_once('-').ok_or_else(bad)?;
            let min: f64 = min.trim().parse().map_err(|_| bad())?;
            let max: f64 = max.trim().parse().map_err(|_| bad())?;
            let step: f64 = step.trim().parse().map_err(|_| bad())?;
            if min >= max || step <= 0.0 {
                return Err(bad().into());
            }
            Ok(block.with_range(min, max, step))
        }
        (BlockType::Slider, None) => Ok(block.with_range(1.0, 10.0, 1.0)),
        (_, Some(_)) => Err(CliError::invalid_input(format!(
            "Block type {} takes no options",
            kind.as_str()
        ))
        .into()),
        (_, None) => Ok(block),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_forms() {
        let date = parse_datetime("2024-03-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        let ts = parse_datetime("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T08:00:00+00:00");
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert!(parse_duration("0d").is_err());
        assert!(parse_duration("5w").is_err());
        assert!(parse_duration("d").is_err());
    }

    #[test]
    fn test_parse_value_pair() {
        assert_eq!(
            parse_value_pair("Notes=a=b").unwrap(),
            ("Notes".to_string(), "a=b".to_string())
        );
        assert!(parse_value_pair("=x").is_err());
        assert!(parse_value_pair("Notes").is_err());
    }

    #[test]
    fn test_parse_block_spec_multiselect() {
        let block = parse_block_spec("multiselect:Activities:work, sport").unwrap();
        assert_eq!(block.kind, BlockType::Multiselect);
        assert_eq!(block.label, "Activities");
        assert_eq!(block.choices(), vec!["work", "sport"]);
    }

    #[test]
    fn test_parse_block_spec_slider() {
        let block = parse_block_spec("slider:Mood:0-5/0.5").unwrap();
        assert_eq!((block.min, block.max, block.step), (Some(0.0), Some(5.0), Some(0.5)));

        let block = parse_block_spec("slider:Energy").unwrap();
        assert_eq!(block.max, Some(10.0));

        assert!(parse_block_spec("slider:Mood:5-1").is_err());
    }

    #[test]
    fn test_parse_block_spec_errors() {
        assert!(parse_block_spec("textarea").is_err());
        assert!(parse_block_spec("wat:Notes").is_err());
        assert!(parse_block_spec("text:Title:extra").is_err());
    }
}
