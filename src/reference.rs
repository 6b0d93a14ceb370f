//! Static reference data: the city table, site identifiers and places
//!
//! Everything here is loaded once at startup and shared read-only.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::Result;
use crate::config::DataConfig;
use crate::error::WeatherTripError;
use crate::models::{City, Place};
use crate::text::normalize;

#[derive(Debug, Deserialize)]
struct CitiesFile {
    cities: Vec<City>,
}

/// Cities keyed by normalized name
#[derive(Debug, Clone, Default)]
pub struct CityTable {
    cities: Vec<City>,
    by_key: HashMap<String, usize>,
}

impl CityTable {
    /// Build a table, rejecting names that collide after normalization
    pub fn new(cities: Vec<City>) -> Result<Self> {
        let mut by_key = HashMap::with_capacity(cities.len());
        for (position, city) in cities.iter().enumerate() {
            let key = city.lookup_key();
            if key.is_empty() {
                return Err(WeatherTripError::config(format!(
                    "City #{} has an empty name",
                    city.id
                )));
            }
            if by_key.insert(key, position).is_some() {
                return Err(WeatherTripError::config(format!(
                    "Duplicate city name '{}'",
                    city.name
                )));
            }
        }
        Ok(Self { cities, by_key })
    }

    pub fn parse_json(json: &str) -> Result<Self> {
        let file: CitiesFile = serde_json::from_str(json)?;
        Self::new(file.cities)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading city table from: {:?}", path);
        let table = Self::parse_json(&read_file(path)?)?;
        info!("Loaded {} cities", table.len());
        Ok(table)
    }

    /// Look up a city regardless of case, diacritics or whitespace
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&City> {
        self.by_key
            .get(&normalize(name))
            .map(|&position| &self.cities[position])
    }

    #[must_use]
    pub fn all(&self) -> &[City] {
        &self.cities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// Weather-site identifiers that differ from the city's numeric id
#[derive(Debug, Clone, Default)]
pub struct SiteIds {
    overrides: HashMap<String, String>,
}

impl SiteIds {
    #[must_use]
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(name, id)| (normalize(&name), id))
                .collect(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading weather site ids from: {:?}", path);
        let overrides: HashMap<String, String> = serde_json::from_str(&read_file(path)?)?;
        Ok(Self::new(overrides))
    }

    /// Site identifier for a city, falling back to its numeric id
    #[must_use]
    pub fn for_city(&self, city: &City) -> String {
        self.overrides
            .get(&city.lookup_key())
            .cloned()
            .unwrap_or_else(|| city.id.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct PlacesFile {
    cities: Vec<CityPlacesRecord>,
}

#[derive(Debug, Deserialize)]
struct CityPlacesRecord {
    name: String,
    places: Vec<PlaceRecord>,
}

#[derive(Debug, Deserialize)]
struct PlaceRecord {
    name: String,
}

/// Places to visit, per city
#[derive(Debug, Clone, Default)]
pub struct PlaceCatalog {
    by_key: HashMap<String, (String, Vec<Place>)>,
}

impl PlaceCatalog {
    pub fn parse_json(json: &str) -> Result<Self> {
        let file: PlacesFile = serde_json::from_str(json)?;
        let by_key = file
            .cities
            .into_iter()
            .map(|record| {
                let places = record
                    .places
                    .iter()
                    .map(|place| Place::attraction(&place.name, &record.name))
                    .collect();
                (normalize(&record.name), (record.name, places))
            })
            .collect();
        Ok(Self { by_key })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading places from: {:?}", path);
        Self::parse_json(&read_file(path)?)
    }

    /// Display name and places for a city
    #[must_use]
    pub fn find(&self, city: &str) -> Option<(&str, &[Place])> {
        self.by_key
            .get(&normalize(city))
            .map(|(name, places)| (name.as_str(), places.as_slice()))
    }
}

/// All static data the service needs
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub cities: CityTable,
    pub site_ids: SiteIds,
    pub places: PlaceCatalog,
}

impl ReferenceData {
    pub fn load(config: &DataConfig) -> Result<Self> {
        let site_ids = match &config.site_ids_path {
            Some(path) => SiteIds::load(path)?,
            None => SiteIds::default(),
        };
        Ok(Self {
            cities: CityTable::load(&config.cities_path)?,
            site_ids,
            places: PlaceCatalog::load(&config.places_path)?,
        })
    }
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(WeatherTripError::config(format!(
            "Reference data file not found: {}",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}
