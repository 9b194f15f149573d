use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FairnessLabel {
    Cheap,
    Fair,
    Expensive,
}

impl FairnessLabel {
    /// Classifies `price` against the city average: below 0.8x is cheap, above 1.3x is
    /// expensive, and both boundaries themselves are fair.
    pub fn classify(price: f64, city_avg: f64) -> Self {
        // Compare scaled by 10 so the 0.8/1.3 thresholds stay exact for whole-unit prices.
        let scaled = price * 10.0;
        if scaled < city_avg * 8.0 {
            Self::Cheap
        } else if scaled > city_avg * 13.0 {
            Self::Expensive
        } else {
            Self::Fair
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cheap => "cheap",
            Self::Fair => "fair",
            Self::Expensive => "expensive",
        }
    }
}

impl fmt::Display for FairnessLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecommendation {
    pub recommended_min: f64,
    pub recommended_max: f64,
    pub fairness_label: FairnessLabel,
    pub confidence_score: f64,
    pub explanation: String,
}

/// Where a recommendation came from. Persisted for auditing, never returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Ai,
    Fallback,
}

impl RecommendationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Fallback => "fallback",
        }
    }
}
