pub mod demand;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod range;
pub mod recommend;

use demand::DemandModel;

const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct PricingOptions {
    pub demand_model: DemandModel,

    /// How long a stored prediction is reused for the same hotel, city and dates.
    pub cache_ttl: chrono::Duration,

    /// Answer provider rate limits with the deterministic recommendation instead of a 429.
    pub fallback_on_rate_limit: bool,
}

impl Default for PricingOptions {
    fn default() -> Self {
        Self {
            demand_model: DemandModel::default(),
            cache_ttl: chrono::Duration::hours(DEFAULT_CACHE_TTL_HOURS),
            fallback_on_rate_limit: false,
        }
    }
}

impl PricingOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("DEMAND_MODEL") {
            match s.parse::<DemandModel>() {
                Ok(model) => out.demand_model = model,
                Err(e) => tracing::warn!(error = %e, "ignoring DEMAND_MODEL"),
            }
        }

        if let Ok(s) = std::env::var("PREDICTION_CACHE_TTL_HOURS") {
            match s.parse::<i64>() {
                Ok(h) if h >= 0 => out.cache_ttl = chrono::Duration::hours(h),
                _ => tracing::warn!(value = %s, "ignoring PREDICTION_CACHE_TTL_HOURS"),
            }
        }

        if let Ok(s) = std::env::var("FALLBACK_ON_RATE_LIMIT") {
            out.fallback_on_rate_limit = matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        out
    }
}
