use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stayfair_core::domain::hotel::StayRequest;
use stayfair_core::llm::anthropic::AnthropicClient;
use stayfair_core::pricing::error::PricingError;
use stayfair_core::pricing::orchestrator::PricingService;
use stayfair_core::pricing::PricingOptions;
use stayfair_core::storage::{lock, reference, PgPricingStore};

/// Pre-computes price predictions for every hotel in a city so that searches for the same stay
/// window are answered from the cache.
#[derive(Debug, Parser)]
#[command(name = "stayfair_worker")]
struct Args {
    /// City whose hotels are priced.
    #[arg(long)]
    city: String,

    /// Check-in date (YYYY-MM-DD).
    #[arg(long)]
    check_in: String,

    /// Check-out date (YYYY-MM-DD).
    #[arg(long)]
    check_out: String,

    #[arg(long, default_value_t = 2)]
    guests: u32,

    /// List the hotels that would be priced without calling the AI provider or writing.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stayfair_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let check_in = parse_date(&args.check_in).context("invalid --check-in")?;
    let check_out = parse_date(&args.check_out).context("invalid --check-out")?;
    anyhow::ensure!(
        check_out > check_in,
        "--check-out ({check_out}) must be after --check-in ({check_in})"
    );
    let city = args.city.trim().to_string();
    anyhow::ensure!(!city.is_empty(), "--city must be non-empty");

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    stayfair_core::storage::migrate(&pool).await?;

    let hotels = reference::list_hotels_in_city(&pool, &city).await?;

    if args.dry_run {
        for hotel in &hotels {
            tracing::info!(hotel_id = %hotel.id, name = %hotel.name, "would price hotel");
        }
        tracing::info!(
            %city,
            %check_in,
            %check_out,
            dry_run = true,
            hotels_len = hotels.len(),
            "cache warm-up (dry-run)"
        );
        return Ok(());
    }

    let mut lock_conn = pool.acquire().await.context("acquire lock connection failed")?;
    let acquired =
        lock::try_acquire_warmup_lock(&mut *lock_conn, &city, check_in, check_out).await?;
    if !acquired {
        tracing::warn!(%city, %check_in, %check_out, "warm-up lock not acquired; another run in progress");
        return Ok(());
    }

    let llm = AnthropicClient::from_settings(&settings)?;
    let service = PricingService::new(
        Arc::new(PgPricingStore::new(pool.clone())),
        Some(Arc::new(llm)),
        PricingOptions::from_env(),
    );

    let mut priced = 0usize;
    let mut cached = 0usize;
    let mut failed = 0usize;

    for hotel in &hotels {
        let stay = StayRequest {
            hotel_id: hotel.id,
            city: city.clone(),
            check_in,
            check_out,
            guests: args.guests,
            budget_min: None,
            budget_max: None,
        };

        match service.recommend(stay).await {
            Ok(res) if res.cached => cached += 1,
            Ok(res) => {
                priced += 1;
                tracing::info!(
                    hotel_id = %hotel.id,
                    label = %res.ai_recommendation.fairness_label,
                    multiplier = res.adjusted_prices.multiplier,
                    "priced hotel"
                );
            }
            Err(PricingError::RateLimited) => {
                tracing::warn!(hotel_id = %hotel.id, "AI provider rate limited; stopping warm-up");
                failed += 1;
                break;
            }
            Err(err) => {
                failed += 1;
                let report = anyhow::anyhow!("{err:#}");
                sentry_anyhow::capture_anyhow(&report);
                tracing::error!(hotel_id = %hotel.id, error = %err, "pricing failed");
            }
        }
    }

    let _ = lock::release_warmup_lock(&mut *lock_conn, &city, check_in, check_out).await;

    tracing::info!(
        %city,
        %check_in,
        %check_out,
        hotels_len = hotels.len(),
        priced,
        cached,
        failed,
        "cache warm-up finished"
    );
    Ok(())
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
}

fn init_sentry(settings: &stayfair_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
