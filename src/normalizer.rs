//! Conversion of scraped rows into normalized forecast entries

use chrono::NaiveDate;
use tracing::warn;

use crate::condition::ConditionRules;
use crate::dates::DateParser;
use crate::fetcher::parse_temperature;
use crate::models::{City, ForecastEntry, RawForecastRow};

/// Shared, immutable normalization tables
#[derive(Debug, Clone, Default)]
pub struct ForecastNormalizer {
    rules: ConditionRules,
    dates: DateParser,
}

impl ForecastNormalizer {
    #[must_use]
    pub fn new(rules: ConditionRules, dates: DateParser) -> Self {
        Self { rules, dates }
    }

    /// Normalize one city's rows, keeping their order.
    ///
    /// Rows whose date token cannot be resolved are dropped with a warning.
    #[must_use]
    pub fn normalize(
        &self,
        city: &City,
        rows: Vec<RawForecastRow>,
        today: NaiveDate,
    ) -> Vec<ForecastEntry> {
        rows.into_iter()
            .filter_map(|row| match self.dates.resolve(&row.date_text, today) {
                Ok(resolved) => Some(ForecastEntry {
                    city_name: city.name.clone(),
                    city_id: city.id.to_string(),
                    region: city.region.clone(),
                    date: resolved.date,
                    original_date: row.date_text,
                    day: resolved.weekday,
                    day_temp: parse_temperature(&row.day_temp_text),
                    night_temp: parse_temperature(&row.night_temp_text),
                    standard_condition: self.rules.standardize(&row.condition_text),
                    condition: row.condition_text,
                    precipitation: row.precipitation_text,
                }),
                Err(e) => {
                    warn!("Skipping row for {}: {}", city.name, e);
                    None
                }
            })
            .collect()
    }
}
