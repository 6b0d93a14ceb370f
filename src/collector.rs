//! Batch collection of forecasts for many cities
//!
//! At most `batch_size` cities are fetched at once. A slot that finishes a
//! fetch rests for `inter_batch_delay` before it takes the next city, so the
//! forecast site never sees more than one batch of requests per pause. The
//! final batch does not rest. Cities are never retried: a failed city is
//! reported and the run carries on.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::Result;
use crate::config::ScraperConfig;
use crate::fetcher::ForecastSource;
use crate::models::{City, ForecastEntry, ForecastIndex};
use crate::normalizer::ForecastNormalizer;

/// Fan-out width and pacing of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            inter_batch_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&ScraperConfig> for BatchSettings {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            inter_batch_delay: config.batch_delay(),
        }
    }
}

/// Final state of a city after a collection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CityStatus {
    Parsed { entries: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityOutcome {
    pub city: String,
    #[serde(flatten)]
    pub status: CityStatus,
}

/// Everything one collection run produced
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    pub entries: Vec<ForecastEntry>,
    pub outcomes: Vec<CityOutcome>,
    pub total_cities: usize,
}

impl CollectionReport {
    #[must_use]
    pub fn successful_cities(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, CityStatus::Parsed { .. }))
            .map(|outcome| outcome.city.as_str())
            .collect()
    }

    #[must_use]
    pub fn failed_cities(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, CityStatus::Failed { .. }))
            .map(|outcome| outcome.city.as_str())
            .collect()
    }

    /// "city: reason" lines for every failed city
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                CityStatus::Failed { reason } => Some(format!("{}: {}", outcome.city, reason)),
                CityStatus::Parsed { .. } => None,
            })
            .collect()
    }

    /// Sorted raw condition phrases seen in this run
    #[must_use]
    pub fn unique_conditions(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .map(|entry| entry.condition.as_str())
            .collect()
    }

    #[must_use]
    pub fn into_index(self) -> ForecastIndex {
        ForecastIndex::from_entries(self.entries)
    }
}

/// Fetches and normalizes forecasts for a list of cities
pub struct Collector {
    source: Arc<dyn ForecastSource>,
    normalizer: Arc<ForecastNormalizer>,
    settings: BatchSettings,
}

impl Collector {
    #[must_use]
    pub fn new(
        source: Arc<dyn ForecastSource>,
        normalizer: Arc<ForecastNormalizer>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            source,
            normalizer,
            settings,
        }
    }

    /// Fetch and normalize the forecast for a single city
    pub async fn fetch_city_forecast(
        &self,
        city: &City,
        today: NaiveDate,
    ) -> Result<Vec<ForecastEntry>> {
        fetch_and_normalize(self.source.as_ref(), &self.normalizer, city, today).await
    }

    /// Collect forecasts for every city, tolerating per-city failures
    #[instrument(skip_all, fields(cities = cities.len()))]
    pub async fn collect_all(&self, cities: &[City], today: NaiveDate) -> CollectionReport {
        let total = cities.len();
        let batch_size = self.settings.batch_size.max(1);
        let delay = self.settings.inter_batch_delay;
        // Cities from this position on are the last batch: nothing waits behind them
        let rest_cutoff = total.saturating_sub(batch_size);

        info!("Collecting forecasts for {} cities in batches of {}", total, batch_size);

        let mut report = CollectionReport {
            total_cities: total,
            ..CollectionReport::default()
        };

        let source = Arc::clone(&self.source);
        let normalizer = Arc::clone(&self.normalizer);
        let mut fetches = stream::iter(cities.iter().cloned().enumerate())
            .map(move |(position, city)| {
                let source = Arc::clone(&source);
                let normalizer = Arc::clone(&normalizer);
                async move {
                    let result =
                        fetch_and_normalize(source.as_ref(), &normalizer, &city, today).await;
                    if position < rest_cutoff && !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    (city, result)
                }
                .boxed()
            })
            .buffer_unordered(batch_size);

        while let Some((city, result)) = fetches.next().await {
            let status = match result {
                Ok(entries) if entries.is_empty() => {
                    warn!("No forecast rows for {}", city.name);
                    CityStatus::Failed {
                        reason: "no forecast rows".to_string(),
                    }
                }
                Ok(entries) => {
                    let count = entries.len();
                    report.entries.extend(entries);
                    CityStatus::Parsed { entries: count }
                }
                Err(e) => {
                    warn!("Failed to collect forecast for {}: {}", city.name, e);
                    CityStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.outcomes.push(CityOutcome {
                city: city.name.clone(),
                status,
            });

            let done = report.outcomes.len();
            if done % batch_size == 0 || done == total {
                info!("Processed {}/{} cities", done, total);
            }
        }

        info!(
            "Collected {} entries, {} cities failed",
            report.entries.len(),
            report.failed_cities().len()
        );
        report
    }
}

async fn fetch_and_normalize(
    source: &dyn ForecastSource,
    normalizer: &ForecastNormalizer,
    city: &City,
    today: NaiveDate,
) -> Result<Vec<ForecastEntry>> {
    let rows = source.fetch_rows(city).await?;
    Ok(normalizer.normalize(city, rows, today))
}
