use serde::{Deserialize, Serialize};

/// A min/avg/max nightly price triple, either the city baseline or the demand-adjusted range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandContext {
    pub is_peak_month: bool,
    pub active_event: Option<ActiveEvent>,
    pub multiplier: f64,
    /// Only set by the weighted model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_score: Option<f64>,
}

impl DemandContext {
    pub fn neutral() -> Self {
        Self {
            is_peak_month: false,
            active_event: None,
            multiplier: 1.0,
            demand_score: None,
        }
    }

    pub fn event_active(&self) -> bool {
        self.active_event.as_ref().is_some_and(|e| e.is_active)
    }

    pub fn event_name(&self) -> Option<&str> {
        self.active_event
            .as_ref()
            .filter(|e| e.is_active)
            .map(|e| e.name.as_str())
    }
}
