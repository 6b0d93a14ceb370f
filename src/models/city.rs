//! City reference model

use serde::{Deserialize, Serialize};

use crate::text::{normalize, slug};

/// A city the forecast site publishes a page for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct City {
    /// Numeric identifier (Turkish licence plate code)
    pub id: u32,
    pub name: String,
    /// Geographical region, e.g. "Karadeniz"
    pub region: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl City {
    /// Key used for case- and diacritic-insensitive lookups
    #[must_use]
    pub fn lookup_key(&self) -> String {
        normalize(&self.name)
    }

    /// URL slug of the city name
    #[must_use]
    pub fn slug(&self) -> String {
        slug(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_keys() {
        let city = City {
            id: 34,
            name: "İstanbul".to_string(),
            region: "Marmara".to_string(),
            latitude: 41.0082,
            longitude: 28.9784,
        };
        assert_eq!(city.lookup_key(), "istanbul");
        assert_eq!(city.slug(), "istanbul");
    }
}
