use crate::domain::pricing::{DemandContext, PriceRange};
use crate::domain::recommendation::PriceRecommendation;
use crate::storage::{CachedPrediction, NewPrediction, PredictionKey};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

type PredictionRow = (
    Uuid,
    DateTime<Utc>,
    Json<PriceRange>,
    Json<PriceRange>,
    Json<DemandContext>,
    Json<PriceRecommendation>,
);

pub async fn find_fresh(
    pool: &sqlx::PgPool,
    key: &PredictionKey,
    fresh_since: DateTime<Utc>,
) -> anyhow::Result<Option<CachedPrediction>> {
    let row = sqlx::query_as::<_, PredictionRow>(
        "SELECT id, created_at, base_prices, adjusted_prices, demand_context, recommendation \
         FROM price_predictions \
         WHERE hotel_id = $1 AND city = $2 AND check_in = $3 AND check_out = $4 \
           AND created_at >= $5 \
         ORDER BY created_at DESC \
         LIMIT 1",
    )
    .bind(key.hotel_id)
    .bind(&key.city)
    .bind(key.check_in)
    .bind(key.check_out)
    .bind(fresh_since)
    .fetch_optional(pool)
    .await
    .context("select price_predictions failed")?;

    Ok(row.map(
        |(id, created_at, base_prices, adjusted_prices, demand_context, recommendation)| {
            CachedPrediction {
                id,
                created_at,
                base_prices: base_prices.0,
                adjusted_prices: adjusted_prices.0,
                demand_context: demand_context.0,
                recommendation: recommendation.0,
            }
        },
    ))
}

pub async fn insert(pool: &sqlx::PgPool, prediction: NewPrediction<'_>) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let key = prediction.key;

    sqlx::query(
        "INSERT INTO price_predictions \
         (id, hotel_id, city, check_in, check_out, base_prices, adjusted_prices, demand_context, \
          recommendation, source, provider, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(id)
    .bind(key.hotel_id)
    .bind(&key.city)
    .bind(key.check_in)
    .bind(key.check_out)
    .bind(Json(prediction.base_prices))
    .bind(Json(prediction.adjusted_prices))
    .bind(Json(prediction.demand_context))
    .bind(Json(prediction.recommendation))
    .bind(prediction.source.as_str())
    .bind(prediction.provider)
    .bind(prediction.created_at)
    .execute(pool)
    .await
    .context("insert price_predictions failed")?;

    Ok(id)
}
