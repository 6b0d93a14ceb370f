//! Data models for the WeatherTrip application
//!
//! This module contains the core domain models organized by concern:
//! - City: static reference entity for a forecast location
//! - Forecast: scraped rows, normalized entries and the date index
//! - Place: tourist places shown for a city

pub mod city;
pub mod forecast;
pub mod place;

// Re-export all public types for convenient access
pub use city::City;
pub use forecast::{ForecastEntry, ForecastIndex, RawForecastRow};
pub use place::{Place, PlaceLocation};
