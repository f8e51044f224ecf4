use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use risk_engine::{EngineConfig, RiskEngine};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_sources::{NominatimGeocoder, OpenMeteoArchiveProvider, StaticPartnerForecast};

mod config;
mod risk_routes;

use config::GatewayConfig;
use risk_routes::{risk_router, RiskState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "risk_gateway=debug,risk_engine=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;

    let engine_config = match &config.engine_config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let engine = RiskEngine::new(
        Arc::new(OpenMeteoArchiveProvider::new()?),
        config.forecast_mode.build()?,
        engine_config,
    )
    .with_partner(Arc::new(StaticPartnerForecast::cptec_mock()));

    let state = RiskState {
        engine: Arc::new(engine),
        geocoder: Arc::new(NominatimGeocoder::new(&config.geocoder_user_agent)?),
    };

    let app = app(state)
        .layer(config.cors_layer())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Event Weather Risk Gateway starting on {}", addr);
    tracing::info!("   Forecast mode: {}", config.forecast_mode);
    tracing::info!("   CORS origins: {}", config.cors_origins.join(", "));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: RiskState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .nest("/api", risk_router(state))
}

async fn home() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Event Weather Risk API is running. Use /api/risk_by_location to query."
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "risk-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
