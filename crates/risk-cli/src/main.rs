//! Event Weather Risk CLI
//!
//! Assesses adverse-weather likelihoods for one place and date and prints the
//! result (or error envelope) as JSON on stdout. Logs go to stderr.
//!
//! Usage:
//!   assess-risk --location "Sao Paulo, Brasil" --date 2024-03-10 --duration 8
//!   assess-risk --lat 40.71 --lon -74.01 --date 2031-07-04 --forecast-mode open-meteo

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use risk_engine::{EngineConfig, ErrorEnvelope, Location, RiskEngine, RiskError, RiskRequest};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use weather_sources::geocode::DEFAULT_USER_AGENT;
use weather_sources::{ForecastMode, Geocoder, NominatimGeocoder, OpenMeteoArchiveProvider, StaticPartnerForecast};

#[derive(Parser, Debug)]
#[command(
    name = "assess-risk",
    about = "Estimate adverse weather likelihoods for an outdoor event"
)]
struct Args {
    /// Place name to geocode (ignored when --lat/--lon are given)
    #[arg(short, long)]
    location: Option<String>,

    /// Latitude in degrees
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude in degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Event date (YYYY-MM-DD, UTC)
    #[arg(short, long)]
    date: String,

    /// Event duration in hours (default from config)
    #[arg(long)]
    duration: Option<i64>,

    /// Engine configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Forecast provider for future dates: simulated | open-meteo
    #[arg(long, default_value_t = ForecastMode::Simulated)]
    forecast_mode: ForecastMode,

    /// Nominatim user agent
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Coordinates from flags, or geocoded from the place name.
async fn resolve_location(args: &Args) -> Result<Location> {
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        return Ok(Location::new(lat, lon, args.location.clone())?);
    }
    let Some(name) = args.location.as_deref() else {
        bail!("either --location or --lat/--lon is required");
    };

    let geocoder = NominatimGeocoder::new(&args.user_agent)?;
    match geocoder.geocode(name).await? {
        Some(location) => Ok(location),
        None => Err(RiskError::InvalidInput(format!("Could not find coordinates for: {}", name)).into()),
    }
}

async fn run(args: &Args) -> Result<String> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading engine config {:?}", path))?,
        None => EngineConfig::default(),
    };

    let location = resolve_location(args).await?;
    let request = RiskRequest::parse(location, &args.date, args.duration, &config)?;

    let engine = RiskEngine::new(
        Arc::new(OpenMeteoArchiveProvider::new()?),
        args.forecast_mode.build()?,
        config,
    )
    .with_partner(Arc::new(StaticPartnerForecast::cptec_mock()));

    let result = engine.assess(&request).await?;
    info!(
        samples = result.sample_count,
        very_uncomfortable = result.likelihoods.very_uncomfortable,
        "Assessment complete"
    );
    Ok(serde_json::to_string_pretty(&result)?)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Event Weather Risk Assessment");
    info!("{}", "=".repeat(60));

    match run(&args).await {
        Ok(json) => {
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Assessment failed: {:#}", e);
            let envelope = match e.downcast_ref::<RiskError>() {
                Some(risk) => ErrorEnvelope::from(risk),
                None => ErrorEnvelope::new(format!("{:#}", e)),
            };
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
