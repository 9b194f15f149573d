use crate::domain::recommendation::{FairnessLabel, PriceRecommendation};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// Shape the AI provider is asked to emit. Unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmPriceRecommendation {
    pub recommended_min: f64,
    pub recommended_max: f64,
    pub fairness_label: FairnessLabel,
    pub confidence_score: f64,
    pub explanation: String,
}

impl LlmPriceRecommendation {
    pub fn validate_and_into_recommendation(self) -> anyhow::Result<PriceRecommendation> {
        ensure!(
            self.recommended_min.is_finite() && self.recommended_max.is_finite(),
            "recommended range must be finite (got {}..{})",
            self.recommended_min,
            self.recommended_max
        );
        ensure!(
            self.recommended_min >= 0.0,
            "recommended_min must be non-negative (got {})",
            self.recommended_min
        );
        ensure!(
            self.recommended_min <= self.recommended_max,
            "recommended_min ({}) exceeds recommended_max ({})",
            self.recommended_min,
            self.recommended_max
        );
        ensure!(
            (0.0..=1.0).contains(&self.confidence_score),
            "confidence_score must be between 0 and 1 (got {})",
            self.confidence_score
        );
        ensure!(
            !self.explanation.trim().is_empty(),
            "explanation must be non-empty"
        );

        Ok(PriceRecommendation {
            recommended_min: self.recommended_min,
            recommended_max: self.recommended_max,
            fairness_label: self.fairness_label,
            confidence_score: self.confidence_score,
            explanation: self.explanation,
        })
    }
}
