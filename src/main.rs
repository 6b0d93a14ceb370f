use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use weathertrip::config::LoggingConfig;
use weathertrip::{
    AppState, BatchSettings, Collector, ForecastNormalizer, HttpForecastSource, ReferenceData,
    WeatherTripConfig, api, web,
};

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = WeatherTripConfig::load_from_path(config_path)?;
    init_logging(&config.logging);

    let reference = ReferenceData::load(&config.data).context("Failed to load reference data")?;
    info!(
        "Serving {} cities, forecast pages from {}",
        reference.cities.len(),
        config.scraper.page_url_template
    );

    let source = HttpForecastSource::new(&config.scraper, reference.site_ids.clone())?;
    let collector = Collector::new(
        Arc::new(source),
        Arc::new(ForecastNormalizer::default()),
        BatchSettings::from(&config.scraper),
    );
    let state = AppState::new(
        Arc::new(reference),
        Arc::new(collector),
        config.scraper.tz()?,
        config.scraper.collect_timeout(),
    );

    web::run(&config.server, api::router(state)).await
}
