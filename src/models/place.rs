//! Tourist place model

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceLocation {
    pub city: String,
    pub country: String,
}

/// A place worth visiting in a city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub categories: Vec<String>,
    pub location: PlaceLocation,
}

impl Place {
    /// Build a tourist attraction entry located in `city`
    #[must_use]
    pub fn attraction(name: &str, city: &str) -> Self {
        Self {
            name: name.to_string(),
            categories: vec!["Turistik Yer".to_string()],
            location: PlaceLocation {
                city: city.to_string(),
                country: "TR".to_string(),
            },
        }
    }
}
