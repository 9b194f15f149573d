use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEvent {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CityEvent {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// `Name (YYYY-MM-DD–YYYY-MM-DD)`; the separator is U+2013, a plain hyphen does not match.
fn event_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+?)\s*\((\d{4}-\d{2}-\d{2})\x{2013}(\d{4}-\d{2}-\d{2})\)$")
            .expect("event pattern is a valid regex")
    })
}

/// Parses "10, 11,12" into `[10, 11, 12]`, keeping input order and skipping anything that is
/// not a month number.
pub fn parse_peak_months(raw: &str) -> Vec<u32> {
    let mut out = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.parse::<u32>() {
            Ok(m) if (1..=12).contains(&m) => out.push(m),
            _ => tracing::warn!(entry = part, "skipping malformed peak month"),
        }
    }
    out
}

/// Parses `;`-separated event entries. Entries that don't match the pattern, or whose dates
/// are not real calendar dates, are skipped.
pub fn parse_events(raw: &str) -> Vec<CityEvent> {
    let mut out = Vec::new();
    for entry in raw.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match parse_event(entry) {
            Some(event) => out.push(event),
            None => tracing::warn!(entry, "skipping malformed event entry"),
        }
    }
    out
}

fn parse_event(entry: &str) -> Option<CityEvent> {
    let caps = event_pattern().captures(entry)?;
    let name = caps.get(1)?.as_str().trim();
    if name.is_empty() {
        return None;
    }
    let start = NaiveDate::parse_from_str(caps.get(2)?.as_str(), "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(caps.get(3)?.as_str(), "%Y-%m-%d").ok()?;
    Some(CityEvent {
        name: name.to_string(),
        start,
        end,
    })
}
