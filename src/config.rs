//! Configuration management for `WeatherTrip`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherTripError;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `WeatherTrip` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherTripConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Forecast scraping settings
    #[serde(default)]
    pub scraper: ScraperConfig,
    /// Static reference data locations
    #[serde(default)]
    pub data: DataConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Forecast scraping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Forecast page URL with `{slug}` and optional `{id}` placeholders
    #[serde(default = "default_page_url_template")]
    pub page_url_template: String,
    /// Browser-like user agent sent with every page request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-page request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Cities fetched concurrently
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Deadline for a full collection triggered by a client request
    #[serde(default = "default_collect_timeout")]
    pub collect_timeout_seconds: u64,
    /// Timezone that decides what "today" means on the forecast site
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Locations of the static JSON files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_cities_path")]
    pub cities_path: PathBuf,
    #[serde(default = "default_places_path")]
    pub places_path: PathBuf,
    /// Optional city name → weather site id overrides
    #[serde(default)]
    pub site_ids_path: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_page_url_template() -> String {
    "https://havadurumu15gunluk.org/havadurumu45gunluk/{slug}-hava-durumu-45-gunluk.html"
        .to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_collect_timeout() -> u64 {
    60
}

fn default_timezone() -> String {
    "Europe/Istanbul".to_string()
}

fn default_cities_path() -> PathBuf {
    PathBuf::from("data/cities.json")
}

fn default_places_path() -> PathBuf {
    PathBuf::from("data/city_places.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            page_url_template: default_page_url_template(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            collect_timeout_seconds: default_collect_timeout(),
            timezone: default_timezone(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cities_path: default_cities_path(),
            places_path: default_places_path(),
            site_ids_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ScraperConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    #[must_use]
    pub fn collect_timeout(&self) -> Duration {
        Duration::from_secs(self.collect_timeout_seconds)
    }

    /// Parsed timezone; `validate` guarantees this succeeds on a loaded config
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| WeatherTripError::config(format!("Unknown timezone '{}'", self.timezone)).into())
    }
}

impl WeatherTripConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .or_else(|| Some(PathBuf::from("config/default.toml")))
        });

        if let Some(config_file) = config_file.filter(|path| path.exists()) {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WEATHERTRIP_SCRAPER__BATCH_SIZE=5
        builder = builder.add_source(
            Environment::with_prefix("WEATHERTRIP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherTripConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weathertrip").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.scraper.page_url_template.is_empty() {
            self.scraper.page_url_template = default_page_url_template();
        }
        if self.scraper.user_agent.is_empty() {
            self.scraper.user_agent = default_user_agent();
        }
        if self.scraper.timeout_seconds == 0 {
            self.scraper.timeout_seconds = default_timeout();
        }
        if self.scraper.batch_size == 0 {
            self.scraper.batch_size = default_batch_size();
        }
        if self.scraper.collect_timeout_seconds == 0 {
            self.scraper.collect_timeout_seconds = default_collect_timeout();
        }
        if self.scraper.timezone.is_empty() {
            self.scraper.timezone = default_timezone();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.scraper.timeout_seconds > 300 {
            return Err(
                WeatherTripError::config("Scraper timeout cannot exceed 300 seconds").into(),
            );
        }

        if !(1..=50).contains(&self.scraper.batch_size) {
            return Err(
                WeatherTripError::config("Scraper batch size must be between 1 and 50").into(),
            );
        }

        if self.scraper.batch_delay_ms > 60_000 {
            return Err(
                WeatherTripError::config("Scraper batch delay cannot exceed 60000 ms").into(),
            );
        }

        if self.scraper.collect_timeout_seconds > 600 {
            return Err(
                WeatherTripError::config("Collection timeout cannot exceed 600 seconds").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherTripError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherTripError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let template = &self.scraper.page_url_template;
        if !template.starts_with("http://") && !template.starts_with("https://") {
            return Err(WeatherTripError::config(
                "Forecast page URL template must be a valid HTTP or HTTPS URL",
            )
            .into());
        }
        if !template.contains("{slug}") && !template.contains("{id}") {
            return Err(WeatherTripError::config(
                "Forecast page URL template must contain {slug} or {id}",
            )
            .into());
        }

        self.scraper.tz()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = WeatherTripConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.scraper.batch_size, 10);
        assert_eq!(config.scraper.batch_delay(), Duration::from_millis(1000));
        assert_eq!(config.scraper.collect_timeout(), Duration::from_secs(60));
        assert_eq!(config.logging.level, "info");
        assert!(config.data.site_ids_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = WeatherTripConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = WeatherTripConfig::default();
        config.scraper.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = WeatherTripConfig::default();
        config.scraper.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_template_and_timezone() {
        let mut config = WeatherTripConfig::default();
        config.scraper.page_url_template = "https://example.com/static.html".to_string();
        assert!(config.validate().is_err());

        let mut config = WeatherTripConfig::default();
        config.scraper.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = WeatherTripConfig::default();
        config.scraper.batch_size = 0;
        config.logging.format = String::new();
        config.apply_defaults();
        assert_eq!(config.scraper.batch_size, 10);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[scraper]\nbatch_size = 5\nbatch_delay_ms = 250\n\n[server]\nport = 8080"
        )
        .unwrap();

        let config = WeatherTripConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.scraper.batch_size, 5);
        assert_eq!(config.scraper.batch_delay_ms, 250);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scraper.timezone, "Europe/Istanbul");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = WeatherTripConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("weathertrip"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
