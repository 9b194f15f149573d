use crate::domain::hotel::{CityDemand, CityPriceStats, Hotel, StayRequest};
use crate::domain::pricing::{DemandContext, PriceRange};
use crate::domain::recommendation::{PriceRecommendation, RecommendationSource};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub mod lock;
pub mod predictions;
pub mod reference;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Cache key for a stored prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionKey {
    pub hotel_id: Uuid,
    pub city: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl PredictionKey {
    /// City is trimmed and lowercased, matching how reference reads and the warm-up lock compare it.
    pub fn for_stay(stay: &StayRequest) -> Self {
        Self {
            hotel_id: stay.hotel_id,
            city: stay.city.trim().to_lowercase(),
            check_in: stay.check_in,
            check_out: stay.check_out,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedPrediction {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub base_prices: PriceRange,
    pub adjusted_prices: PriceRange,
    pub demand_context: DemandContext,
    pub recommendation: PriceRecommendation,
}

#[derive(Debug, Clone)]
pub struct NewPrediction<'a> {
    pub key: &'a PredictionKey,
    pub base_prices: &'a PriceRange,
    pub adjusted_prices: &'a PriceRange,
    pub demand_context: &'a DemandContext,
    pub recommendation: &'a PriceRecommendation,
    pub source: RecommendationSource,
    pub provider: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Reads reference data and the append-only prediction cache.
#[async_trait::async_trait]
pub trait PricingStore: Send + Sync {
    async fn fetch_hotel(&self, hotel_id: Uuid) -> anyhow::Result<Option<Hotel>>;

    async fn fetch_city_price_stats(&self, city: &str) -> anyhow::Result<Option<CityPriceStats>>;

    async fn fetch_city_demand(&self, city: &str) -> anyhow::Result<Option<CityDemand>>;

    /// Newest prediction for `key` created at or after `fresh_since`.
    async fn find_fresh_prediction(
        &self,
        key: &PredictionKey,
        fresh_since: DateTime<Utc>,
    ) -> anyhow::Result<Option<CachedPrediction>>;

    async fn insert_prediction(&self, prediction: NewPrediction<'_>) -> anyhow::Result<Uuid>;
}

#[derive(Debug, Clone)]
pub struct PgPricingStore {
    pool: sqlx::PgPool,
}

impl PgPricingStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PricingStore for PgPricingStore {
    async fn fetch_hotel(&self, hotel_id: Uuid) -> anyhow::Result<Option<Hotel>> {
        reference::fetch_hotel(&self.pool, hotel_id).await
    }

    async fn fetch_city_price_stats(&self, city: &str) -> anyhow::Result<Option<CityPriceStats>> {
        reference::fetch_city_price_stats(&self.pool, city).await
    }

    async fn fetch_city_demand(&self, city: &str) -> anyhow::Result<Option<CityDemand>> {
        reference::fetch_city_demand(&self.pool, city).await
    }

    async fn find_fresh_prediction(
        &self,
        key: &PredictionKey,
        fresh_since: DateTime<Utc>,
    ) -> anyhow::Result<Option<CachedPrediction>> {
        predictions::find_fresh(&self.pool, key, fresh_since).await
    }

    async fn insert_prediction(&self, prediction: NewPrediction<'_>) -> anyhow::Result<Uuid> {
        predictions::insert(&self.pool, prediction).await
    }
}
