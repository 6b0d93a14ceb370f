//! Searching the forecast index by condition or temperature over a date range

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::Result;
use crate::error::WeatherTripError;
use crate::models::{ForecastEntry, ForecastIndex};
use crate::text::normalize;

/// Coarse daytime temperature bands offered next to the condition labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemperatureBand {
    Hot,
    Warm,
    Cool,
    Cold,
}

impl TemperatureBand {
    pub const ALL: [TemperatureBand; 4] = [Self::Hot, Self::Warm, Self::Cool, Self::Cold];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Hot => "Sıcak",
            Self::Warm => "Ilık",
            Self::Cool => "Serin",
            Self::Cold => "Soğuk",
        }
    }

    /// Band a daytime temperature (Celsius) falls into
    #[must_use]
    pub fn of(day_temp: i32) -> Self {
        match day_temp {
            25.. => Self::Hot,
            18..=24 => Self::Warm,
            10..=17 => Self::Cool,
            _ => Self::Cold,
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let key = normalize(label);
        Self::ALL
            .into_iter()
            .find(|band| normalize(band.label()) == key)
    }
}

/// What a forecast day has to look like to match a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherCriterion {
    /// A standard condition label, canonical or not
    Condition { label: String, key: String },
    Temperature(TemperatureBand),
}

impl WeatherCriterion {
    pub fn parse(label: &str) -> Result<Self> {
        let label = label.trim();
        if normalize(label).is_empty() {
            return Err(WeatherTripError::validation("condition must not be empty"));
        }
        if let Some(band) = TemperatureBand::from_label(label) {
            return Ok(Self::Temperature(band));
        }
        Ok(Self::Condition {
            label: label.to_string(),
            key: normalize(label),
        })
    }

    #[must_use]
    pub fn matches(&self, entry: &ForecastEntry) -> bool {
        match self {
            Self::Condition { key, .. } => normalize(entry.standard_condition.label()) == *key,
            Self::Temperature(band) => TemperatureBand::of(entry.day_temp) == *band,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Condition { label, .. } => label,
            Self::Temperature(band) => band.label(),
        }
    }
}

impl fmt::Display for WeatherCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(WeatherTripError::validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from ISO `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_iso_date(start)?, parse_iso_date(end)?)
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date of the range, ascending
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| WeatherTripError::validation(format!("invalid date '{text}', expected YYYY-MM-DD")))
}

/// Names of matching cities per date; dates without a match are left out.
#[must_use]
pub fn cities_by_date(
    index: &ForecastIndex,
    criterion: &WeatherCriterion,
    range: &DateRange,
) -> BTreeMap<NaiveDate, Vec<String>> {
    index
        .iter()
        .filter(|(date, _)| range.contains(**date))
        .filter_map(|(date, entries)| {
            let cities: Vec<String> = entries
                .iter()
                .filter(|entry| criterion.matches(entry))
                .map(|entry| entry.city_name.clone())
                .collect();
            (!cities.is_empty()).then_some((*date, cities))
        })
        .collect()
}

/// A city whose forecast matches on every day of a range
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityMatch {
    pub city_name: String,
    pub city_id: String,
    pub region: String,
    pub dates: Vec<NaiveDate>,
    pub entries: Vec<ForecastEntry>,
}

/// Cities matching the criterion on every date of the range.
///
/// A city with no forecast for one of the dates does not qualify. Results
/// are ordered by city name.
#[must_use]
pub fn qualifying_cities(
    index: &ForecastIndex,
    criterion: &WeatherCriterion,
    range: &DateRange,
) -> Vec<CityMatch> {
    let mut by_city: BTreeMap<&str, Vec<&ForecastEntry>> = BTreeMap::new();
    for (_, entries) in index.iter().filter(|(date, _)| range.contains(**date)) {
        for entry in entries {
            by_city.entry(entry.city_name.as_str()).or_default().push(entry);
        }
    }

    by_city
        .into_values()
        .filter_map(|entries| {
            let qualifies = range.days().all(|day| {
                entries
                    .iter()
                    .find(|entry| entry.date == day)
                    .is_some_and(|entry| criterion.matches(entry))
            });
            if !qualifies {
                return None;
            }
            let first = entries.first()?;
            Some(CityMatch {
                city_name: first.city_name.clone(),
                city_id: first.city_id.clone(),
                region: first.region.clone(),
                dates: entries.iter().map(|entry| entry.date).collect(),
                entries: entries.into_iter().cloned().collect(),
            })
        })
        .collect()
}
