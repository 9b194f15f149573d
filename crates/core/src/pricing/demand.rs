use crate::domain::pricing::{ActiveEvent, DemandContext};
use crate::pricing::events::CityEvent;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const PEAK_MONTH_BONUS: f64 = 0.20;
const EVENT_BONUS: f64 = 0.30;

const WEIGHTED_PEAK_SCORE: f64 = 0.30;
const WEIGHTED_SCORE_CAP: f64 = 1.0;
const WEIGHTED_PRICE_SLOPE: f64 = 0.5;

/// The two demand models. They are not numerically equivalent; one is chosen per process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandModel {
    /// Flat bonuses: +0.20 in a peak month, +0.30 when check-in falls inside an event.
    #[default]
    Binary,
    /// Severity-weighted score over every event overlapping the stay, capped at 1.0.
    Weighted,
}

impl FromStr for DemandModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(Self::Binary),
            "weighted" => Ok(Self::Weighted),
            other => anyhow::bail!("unknown demand model: {other} (expected binary|weighted)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl EventSeverity {
    /// Keyword classification on the lowercased event name. More specific keywords are checked
    /// first ("durga puja" is high even though "puja" alone is medium).
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

        if has(&["diwali", "kumbh", "new year"]) {
            Self::VeryHigh
        } else if has(&["wedding", "durga puja", "navratri"]) {
            Self::High
        } else if has(&["festival", "jayanti", "puja"]) {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            Self::Low => 0.10,
            Self::Medium => 0.20,
            Self::High => 0.30,
            Self::VeryHigh => 0.40,
        }
    }
}

pub fn score(
    model: DemandModel,
    peak_months: &[u32],
    events: &[CityEvent],
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> DemandContext {
    match model {
        DemandModel::Binary => score_binary(peak_months, events, check_in),
        DemandModel::Weighted => score_weighted(peak_months, events, check_in, check_out),
    }
}

fn is_peak(peak_months: &[u32], check_in: NaiveDate) -> bool {
    peak_months.contains(&check_in.month())
}

fn score_binary(peak_months: &[u32], events: &[CityEvent], check_in: NaiveDate) -> DemandContext {
    let is_peak_month = is_peak(peak_months, check_in);
    let active_event = events.iter().find(|e| e.contains(check_in)).map(|e| ActiveEvent {
        name: e.name.clone(),
        is_active: true,
    });

    let mut multiplier = 1.0;
    if is_peak_month {
        multiplier += PEAK_MONTH_BONUS;
    }
    if active_event.is_some() {
        multiplier += EVENT_BONUS;
    }

    DemandContext {
        is_peak_month,
        active_event,
        multiplier,
        demand_score: None,
    }
}

// A stay inside the event is caught by the check-in test; the third test catches events inside
// the stay.
fn overlaps_stay(event: &CityEvent, check_in: NaiveDate, check_out: NaiveDate) -> bool {
    event.contains(check_in)
        || event.contains(check_out)
        || (check_in <= event.start && event.end <= check_out)
}

fn score_weighted(
    peak_months: &[u32],
    events: &[CityEvent],
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> DemandContext {
    let is_peak_month = is_peak(peak_months, check_in);
    let mut demand_score = if is_peak_month { WEIGHTED_PEAK_SCORE } else { 0.0 };

    let mut strongest: Option<(EventSeverity, &CityEvent)> = None;
    for event in events.iter().filter(|e| overlaps_stay(e, check_in, check_out)) {
        let severity = EventSeverity::classify(&event.name);
        demand_score += severity.weight();
        if strongest.map_or(true, |(s, _)| severity > s) {
            strongest = Some((severity, event));
        }
    }
    let demand_score = demand_score.min(WEIGHTED_SCORE_CAP);

    DemandContext {
        is_peak_month,
        active_event: strongest.map(|(_, e)| ActiveEvent {
            name: e.name.clone(),
            is_active: true,
        }),
        multiplier: 1.0 + demand_score * WEIGHTED_PRICE_SLOPE,
        demand_score: Some(demand_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(name: &str, start: NaiveDate, end: NaiveDate) -> CityEvent {
        CityEvent {
            name: name.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn binary_is_neutral_without_signals() {
        let ctx = score(DemandModel::Binary, &[12], &[], d(2026, 6, 1), d(2026, 6, 3));
        assert!(!ctx.is_peak_month);
        assert!(!ctx.event_active());
        assert_eq!(ctx.multiplier, 1.0);
    }

    #[test]
    fn binary_composes_peak_and_event() {
        let events = vec![event("Diwali", d(2026, 11, 6), d(2026, 11, 10))];
        let ctx = score(DemandModel::Binary, &[11], &events, d(2026, 11, 8), d(2026, 11, 9));
        assert!(ctx.is_peak_month);
        assert_eq!(ctx.event_name(), Some("Diwali"));
        assert_eq!(ctx.multiplier, 1.5);
    }

    #[test]
    fn binary_event_boundaries_are_inclusive() {
        let events = vec![event("Holi", d(2026, 3, 3), d(2026, 3, 4))];
        for check_in in [d(2026, 3, 3), d(2026, 3, 4)] {
            let ctx = score(DemandModel::Binary, &[], &events, check_in, d(2026, 3, 8));
            assert!(ctx.event_active(), "check-in {check_in} should be inside the event");
            assert!((ctx.multiplier - 1.3).abs() < 1e-9);
        }
        let ctx = score(DemandModel::Binary, &[], &events, d(2026, 3, 5), d(2026, 3, 8));
        assert!(!ctx.event_active());
    }

    #[test]
    fn binary_only_looks_at_check_in() {
        // Stay runs into the event but check-in is before it.
        let events = vec![event("Holi", d(2026, 3, 3), d(2026, 3, 4))];
        let ctx = score(DemandModel::Binary, &[], &events, d(2026, 3, 1), d(2026, 3, 4));
        assert!(!ctx.event_active());
        assert_eq!(ctx.multiplier, 1.0);
    }

    #[test]
    fn severity_keywords() {
        assert_eq!(EventSeverity::classify("Diwali Celebrations"), EventSeverity::VeryHigh);
        assert_eq!(EventSeverity::classify("New Year's Eve"), EventSeverity::VeryHigh);
        assert_eq!(EventSeverity::classify("Durga Puja"), EventSeverity::High);
        assert_eq!(EventSeverity::classify("Wedding Season"), EventSeverity::High);
        assert_eq!(EventSeverity::classify("Ganesh Puja"), EventSeverity::Medium);
        assert_eq!(EventSeverity::classify("Desert Festival"), EventSeverity::Medium);
        assert_eq!(EventSeverity::classify("Marathon"), EventSeverity::Low);
    }

    #[test]
    fn weighted_counts_any_overlap() {
        let events = vec![
            // check-out inside
            event("Desert Festival", d(2026, 2, 5), d(2026, 2, 7)),
            // fully inside the stay
            event("Marathon", d(2026, 2, 2), d(2026, 2, 3)),
            // no overlap
            event("Diwali", d(2026, 11, 6), d(2026, 11, 10)),
        ];
        let ctx = score(DemandModel::Weighted, &[], &events, d(2026, 2, 1), d(2026, 2, 5));
        let demand_score = ctx.demand_score.unwrap();
        assert!((demand_score - 0.30).abs() < 1e-9);
        assert!((ctx.multiplier - 1.15).abs() < 1e-9);
        assert_eq!(ctx.event_name(), Some("Desert Festival"));
    }

    #[test]
    fn weighted_score_is_capped() {
        let events = vec![
            event("Diwali", d(2026, 11, 6), d(2026, 11, 10)),
            event("Kumbh Mela", d(2026, 11, 1), d(2026, 11, 30)),
            event("Wedding Season", d(2026, 11, 1), d(2026, 12, 15)),
        ];
        let ctx = score(DemandModel::Weighted, &[11], &events, d(2026, 11, 7), d(2026, 11, 9));
        assert_eq!(ctx.demand_score, Some(1.0));
        assert_eq!(ctx.multiplier, 1.5);
        assert_eq!(ctx.event_name(), Some("Diwali"));
    }

    #[test]
    fn parses_model_names() {
        assert_eq!("Weighted".parse::<DemandModel>().unwrap(), DemandModel::Weighted);
        assert_eq!(" binary ".parse::<DemandModel>().unwrap(), DemandModel::Binary);
        assert!("linear".parse::<DemandModel>().is_err());
    }
}
