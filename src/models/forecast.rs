//! Scraped forecast rows, normalized entries and the date index

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::condition::StandardCondition;

/// One forecast row as scraped, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForecastRow {
    pub city_name: String,
    pub date_text: String,
    pub condition_text: String,
    pub day_temp_text: String,
    pub night_temp_text: String,
    pub precipitation_text: Option<String>,
}

/// A normalized forecast observation for one city and day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    pub city_name: String,
    pub city_id: String,
    pub region: String,
    /// Calendar date the row refers to
    pub date: NaiveDate,
    /// Date token as printed on the page ("Bugün", "05 Oca Pzt")
    pub original_date: String,
    /// Turkish weekday abbreviation
    pub day: String,
    /// Daytime temperature in Celsius
    pub day_temp: i32,
    /// Night temperature in Celsius
    pub night_temp: i32,
    /// Condition phrase as printed on the page
    pub condition: String,
    pub standard_condition: StandardCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<String>,
}

/// Forecast entries grouped by date, ascending
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ForecastIndex {
    by_date: BTreeMap<NaiveDate, Vec<ForecastEntry>>,
}

impl ForecastIndex {
    /// Group entries by date, keeping insertion order within each date
    #[must_use]
    pub fn from_entries<I: IntoIterator<Item = ForecastEntry>>(entries: I) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<ForecastEntry>> = BTreeMap::new();
        for entry in entries {
            by_date.entry(entry.date).or_default().push(entry);
        }
        Self { by_date }
    }

    #[must_use]
    pub fn get(&self, date: NaiveDate) -> &[ForecastEntry] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Vec<ForecastEntry>)> {
        self.by_date.iter()
    }

    /// Number of distinct dates
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Total number of entries across all dates
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }
}
