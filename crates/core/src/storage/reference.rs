use crate::domain::hotel::{CityDemand, CityPriceStats, Hotel};
use anyhow::Context;
use uuid::Uuid;

pub async fn fetch_hotel(pool: &sqlx::PgPool, hotel_id: Uuid) -> anyhow::Result<Option<Hotel>> {
    let row = sqlx::query_as::<_, (Uuid, String, String, Option<f64>, i32, f64)>(
        "SELECT id, name, city, rating, review_count, price_per_night \
         FROM hotels \
         WHERE id = $1",
    )
    .bind(hotel_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("select hotels failed (id={hotel_id})"))?;

    Ok(row.map(
        |(id, name, city, rating, review_count, price_per_night)| Hotel {
            id,
            name,
            city,
            rating,
            review_count,
            price_per_night,
        },
    ))
}

pub async fn list_hotels_in_city(pool: &sqlx::PgPool, city: &str) -> anyhow::Result<Vec<Hotel>> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, Option<f64>, i32, f64)>(
        "SELECT id, name, city, rating, review_count, price_per_night \
         FROM hotels \
         WHERE lower(city) = lower($1) \
         ORDER BY name ASC, id ASC",
    )
    .bind(city.trim())
    .fetch_all(pool)
    .await
    .with_context(|| format!("select hotels failed (city={city})"))?;

    Ok(rows
        .into_iter()
        .map(
            |(id, name, city, rating, review_count, price_per_night)| Hotel {
                id,
                name,
                city,
                rating,
                review_count,
                price_per_night,
            },
        )
        .collect())
}

pub async fn fetch_city_price_stats(
    pool: &sqlx::PgPool,
    city: &str,
) -> anyhow::Result<Option<CityPriceStats>> {
    let row = sqlx::query_as::<_, (Option<f64>, Option<f64>, Option<f64>)>(
        "SELECT min_price, avg_price, max_price \
         FROM city_price_stats \
         WHERE city_key = lower($1)",
    )
    .bind(city.trim())
    .fetch_optional(pool)
    .await
    .with_context(|| format!("select city_price_stats failed (city={city})"))?;

    Ok(match row {
        Some((Some(min), Some(avg), Some(max))) => Some(CityPriceStats { min, avg, max }),
        _ => None,
    })
}

pub async fn fetch_city_demand(
    pool: &sqlx::PgPool,
    city: &str,
) -> anyhow::Result<Option<CityDemand>> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        "SELECT city, peak_months, events \
         FROM city_demand \
         WHERE lower(city) = lower($1)",
    )
    .bind(city.trim())
    .fetch_optional(pool)
    .await
    .with_context(|| format!("select city_demand failed (city={city})"))?;

    Ok(row.map(|(city, peak_months, events)| CityDemand {
        city,
        peak_months,
        events,
    }))
}
