//! `WeatherTrip` - find Turkish cities by their upcoming weather
//!
//! This library scrapes the daily forecast tables of a Turkish weather site
//! for every province, normalizes free-text conditions into a small search
//! vocabulary, and answers "where will it be sunny next weekend" style
//! questions over HTTP.

pub mod api;
pub mod collector;
pub mod condition;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod normalizer;
pub mod reference;
pub mod search;
pub mod text;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use collector::{BatchSettings, CollectionReport, Collector};
pub use condition::{CanonicalCondition, ConditionRules, StandardCondition};
pub use config::WeatherTripConfig;
pub use error::WeatherTripError;
pub use fetcher::{ForecastSource, HttpForecastSource};
pub use models::{City, ForecastEntry, ForecastIndex, Place, RawForecastRow};
pub use normalizer::ForecastNormalizer;
pub use reference::ReferenceData;
pub use search::{DateRange, TemperatureBand, WeatherCriterion};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherTripError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
