use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    /// 0..=5, absent for hotels without reviews.
    pub rating: Option<f64>,
    pub review_count: i32,
    pub price_per_night: f64,
}

/// Nightly price aggregate across a city's hotel inventory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CityPriceStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

/// Raw demand text as stored per city.
///
/// `peak_months` is a comma-separated list of month numbers ("10,11,12") and `events` is a
/// semicolon-separated list of `Name (YYYY-MM-DD–YYYY-MM-DD)` entries (en-dash between dates).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityDemand {
    pub city: String,
    pub peak_months: String,
    pub events: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StayRequest {
    pub hotel_id: Uuid,
    pub city: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    #[serde(default)]
    pub budget_min: Option<f64>,
    #[serde(default)]
    pub budget_max: Option<f64>,
}

impl StayRequest {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Rejects empty or inverted stays and inconsistent budgets.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.city.trim().is_empty(), "city must be non-empty");
        anyhow::ensure!(
            self.nights() > 0,
            "check_out ({}) must be after check_in ({})",
            self.check_out,
            self.check_in
        );
        anyhow::ensure!(self.guests >= 1, "guests must be at least 1");

        for (field, value) in [("budget_min", self.budget_min), ("budget_max", self.budget_max)] {
            if let Some(v) = value {
                anyhow::ensure!(
                    v.is_finite() && v >= 0.0,
                    "{field} must be a non-negative number (got {v})"
                );
            }
        }
        if let (Some(lo), Some(hi)) = (self.budget_min, self.budget_max) {
            anyhow::ensure!(lo <= hi, "budget_min ({lo}) must not exceed budget_max ({hi})");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stay(check_in: (i32, u32, u32), check_out: (i32, u32, u32)) -> StayRequest {
        StayRequest {
            hotel_id: Uuid::nil(),
            city: "Jaipur".to_string(),
            check_in: NaiveDate::from_ymd_opt(check_in.0, check_in.1, check_in.2).unwrap(),
            check_out: NaiveDate::from_ymd_opt(check_out.0, check_out.1, check_out.2).unwrap(),
            guests: 2,
            budget_min: None,
            budget_max: None,
        }
    }

    #[test]
    fn counts_nights_between_dates() {
        assert_eq!(stay((2026, 10, 30), (2026, 11, 2)).nights(), 3);
    }

    #[test]
    fn rejects_zero_and_negative_stays() {
        assert!(stay((2026, 10, 30), (2026, 10, 30)).validate().is_err());
        assert!(stay((2026, 10, 30), (2026, 10, 29)).validate().is_err());
        assert!(stay((2026, 10, 30), (2026, 10, 31)).validate().is_ok());
    }

    #[test]
    fn rejects_inverted_budget() {
        let mut s = stay((2026, 10, 30), (2026, 11, 2));
        s.budget_min = Some(6000.0);
        s.budget_max = Some(4000.0);
        assert!(s.validate().is_err());

        s.budget_max = Some(6000.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_zero_guests() {
        let mut s = stay((2026, 10, 30), (2026, 11, 2));
        s.guests = 0;
        assert!(s.validate().is_err());
    }
}
