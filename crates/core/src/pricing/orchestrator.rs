use crate::domain::hotel::StayRequest;
use crate::domain::pricing::{DemandContext, PriceRange};
use crate::domain::recommendation::{PriceRecommendation, RecommendationSource};
use crate::llm::LlmClient;
use crate::pricing::error::PricingError;
use crate::pricing::recommend::{self, RecommendationInput};
use crate::pricing::{demand, events, range, PricingOptions};
use crate::storage::{CachedPrediction, NewPrediction, PredictionKey, PricingStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedPrices {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSummary {
    pub is_peak_month: bool,
    pub event_active: bool,
    pub event_name: Option<String>,
    pub demand_multiplier: f64,
}

impl From<&DemandContext> for DemandSummary {
    fn from(ctx: &DemandContext) -> Self {
        Self {
            is_peak_month: ctx.is_peak_month,
            event_active: ctx.event_active(),
            event_name: ctx.event_name().map(str::to_string),
            demand_multiplier: ctx.multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResponse {
    pub cached: bool,
    pub base_city_prices: PriceRange,
    pub adjusted_prices: AdjustedPrices,
    pub ai_recommendation: PriceRecommendation,
    pub demand_context: DemandSummary,
}

impl PricingResponse {
    fn assemble(
        cached: bool,
        base: PriceRange,
        adjusted: PriceRange,
        demand: &DemandContext,
        recommendation: PriceRecommendation,
    ) -> Self {
        Self {
            cached,
            base_city_prices: base,
            adjusted_prices: AdjustedPrices {
                min: adjusted.min,
                avg: adjusted.avg,
                max: adjusted.max,
                multiplier: demand.multiplier,
            },
            ai_recommendation: recommendation,
            demand_context: DemandSummary::from(demand),
        }
    }

    fn from_cached(prediction: CachedPrediction) -> Self {
        Self::assemble(
            true,
            prediction.base_prices,
            prediction.adjusted_prices,
            &prediction.demand_context,
            prediction.recommendation,
        )
    }
}

/// Runs one pricing request: cache check, reference fetch, demand scoring, range calculation,
/// AI recommendation and persistence.
#[derive(Clone)]
pub struct PricingService {
    store: Arc<dyn PricingStore>,
    llm: Option<Arc<dyn LlmClient>>,
    options: PricingOptions,
}

impl PricingService {
    /// `llm` is `None` when no AI credential is configured; requests then fail before touching
    /// the network.
    pub fn new(
        store: Arc<dyn PricingStore>,
        llm: Option<Arc<dyn LlmClient>>,
        options: PricingOptions,
    ) -> Self {
        Self {
            store,
            llm,
            options,
        }
    }

    pub async fn recommend(&self, stay: StayRequest) -> Result<PricingResponse, PricingError> {
        self.recommend_at(stay, Utc::now()).await
    }

    pub async fn recommend_at(
        &self,
        stay: StayRequest,
        now: DateTime<Utc>,
    ) -> Result<PricingResponse, PricingError> {
        stay.validate()
            .map_err(|e| PricingError::InvalidRequest(format!("{e:#}")))?;

        let llm = self.llm.as_deref().ok_or_else(|| {
            PricingError::Configuration("ANTHROPIC_API_KEY is not configured".to_string())
        })?;

        let key = PredictionKey::for_stay(&stay);

        // Cache lookup failures only cost an extra AI call.
        let fresh_since = now - self.options.cache_ttl;
        match self.store.find_fresh_prediction(&key, fresh_since).await {
            Ok(Some(prediction)) => {
                tracing::info!(
                    hotel_id = %key.hotel_id,
                    city = %key.city,
                    prediction_id = %prediction.id,
                    "price prediction cache hit"
                );
                return Ok(PricingResponse::from_cached(prediction));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(hotel_id = %key.hotel_id, error = %e, "prediction cache lookup failed");
            }
        }

        let hotel = self
            .store
            .fetch_hotel(stay.hotel_id)
            .await?
            .ok_or(PricingError::HotelNotFound(stay.hotel_id))?;
        let stats = self.store.fetch_city_price_stats(&key.city).await?;
        let city_demand = self.store.fetch_city_demand(&key.city).await?;

        if stats.is_none() {
            tracing::info!(city = %key.city, "no city price stats; using hotel price heuristic");
        }

        let demand_ctx = match &city_demand {
            Some(d) => {
                let peak_months = events::parse_peak_months(&d.peak_months);
                let city_events = events::parse_events(&d.events);
                demand::score(
                    self.options.demand_model,
                    &peak_months,
                    &city_events,
                    stay.check_in,
                    stay.check_out,
                )
            }
            None => {
                tracing::info!(city = %key.city, "no city demand record; assuming neutral demand");
                DemandContext::neutral()
            }
        };

        let base = range::base_range(stats, &hotel);
        let adjusted = range::adjust(&base, demand_ctx.multiplier);

        let input = RecommendationInput {
            hotel: &hotel,
            stay: &stay,
            base: &base,
            adjusted: &adjusted,
            demand: &demand_ctx,
        };
        let outcome = match recommend::request_recommendation(llm, &input).await {
            Ok(outcome) => outcome,
            Err(PricingError::RateLimited) if self.options.fallback_on_rate_limit => {
                recommend::RecommendationOutcome {
                    recommendation: recommend::fallback_recommendation(&input),
                    source: RecommendationSource::Fallback,
                }
            }
            Err(e) => return Err(e),
        };

        let provider = llm.provider().as_str();
        let persisted = self
            .store
            .insert_prediction(NewPrediction {
                key: &key,
                base_prices: &base,
                adjusted_prices: &adjusted,
                demand_context: &demand_ctx,
                recommendation: &outcome.recommendation,
                source: outcome.source,
                provider,
                created_at: now,
            })
            .await;
        match persisted {
            Ok(prediction_id) => tracing::info!(
                hotel_id = %key.hotel_id,
                city = %key.city,
                %prediction_id,
                source = outcome.source.as_str(),
                multiplier = demand_ctx.multiplier,
                "persisted price prediction"
            ),
            Err(e) => tracing::error!(
                hotel_id = %key.hotel_id,
                error = %e,
                "failed to persist price prediction; returning uncached result"
            ),
        }

        Ok(PricingResponse::assemble(
            false,
            base,
            adjusted,
            &demand_ctx,
            outcome.recommendation,
        ))
    }
}
