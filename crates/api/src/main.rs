use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stayfair_core::domain::hotel::StayRequest;
use stayfair_core::llm::anthropic::AnthropicClient;
use stayfair_core::llm::LlmClient;
use stayfair_core::pricing::error::PricingError;
use stayfair_core::pricing::orchestrator::{PricingResponse, PricingService};
use stayfair_core::pricing::PricingOptions;
use stayfair_core::storage::PgPricingStore;

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

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match stayfair_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    // A missing key is reported per request as a configuration failure.
    let llm: Option<Arc<dyn LlmClient>> = match AnthropicClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::error!(error = %e, "AI client unavailable; price recommendations will fail");
            None
        }
    };

    let options = PricingOptions::from_env();
    tracing::info!(
        demand_model = ?options.demand_model,
        cache_ttl_hours = options.cache_ttl.num_hours(),
        fallback_on_rate_limit = options.fallback_on_rate_limit,
        "pricing options"
    );

    let service = pool
        .map(|pool| PricingService::new(Arc::new(PgPricingStore::new(pool)), llm, options));
    let state = AppState { service };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/price-recommendation", post(price_recommendation))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: Option<PricingService>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
    timestamp: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(err: &PricingError) -> ApiError {
    let code = err.status_code();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            error: err.user_message(),
            code,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    )
}

async fn price_recommendation(
    State(state): State<AppState>,
    body: Result<Json<StayRequest>, JsonRejection>,
) -> Result<Json<PricingResponse>, ApiError> {
    let Json(stay) = body.map_err(|rejection| {
        error_response(&PricingError::InvalidRequest(rejection.body_text()))
    })?;

    let Some(service) = &state.service else {
        return Err(error_response(&PricingError::Configuration(
            "database is not available".to_string(),
        )));
    };

    let hotel_id = stay.hotel_id;
    match service.recommend(stay).await {
        Ok(res) => Ok(Json(res)),
        Err(err) => {
            if err.is_server_fault() {
                let report = anyhow::anyhow!("{err:#}");
                sentry_anyhow::capture_anyhow(&report);
                tracing::error!(%hotel_id, error = %err, "price recommendation failed");
            } else {
                tracing::warn!(%hotel_id, error = %err, "price recommendation rejected");
            }
            Err(error_response(&err))
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
