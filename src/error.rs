//! Error types and handling for `WeatherTrip`

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for the `WeatherTrip` application
#[derive(Error, Debug)]
pub enum WeatherTripError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Forecast site unreachable, DNS failure or non-success status
    #[error("Upstream error for {city}: {message}")]
    Upstream { city: String, message: String },

    /// Forecast page fetched but no known table layout found
    #[error("Unexpected page structure for {city}: {message}")]
    PageStructure { city: String, message: String },

    /// Unparseable token inside a scraped row
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Lookup of a static reference entry failed
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Collection exceeded the request deadline
    #[error("Timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Reference data decoding errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

}

impl WeatherTripError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new upstream error for a city
    pub fn upstream<C: Into<String>, S: Into<String>>(city: C, message: S) -> Self {
        Self::Upstream {
            city: city.into(),
            message: message.into(),
        }
    }

    /// Create a new page structure error for a city
    pub fn page_structure<C: Into<String>, S: Into<String>>(city: C, message: S) -> Self {
        Self::PageStructure {
            city: city.into(),
            message: message.into(),
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }


    /// Whether this error only affects a single city and must not abort a collection
    #[must_use]
    pub fn is_city_scoped(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::PageStructure { .. })
    }

    /// HTTP status used when the error reaches a client
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            Self::Upstream { city, .. } | Self::PageStructure { city, .. } => {
                format!("Could not retrieve weather data for {city}")
            }
            Self::Parse { message } => format!("Could not read forecast data: {message}"),
            Self::Validation { message } => format!("Invalid input: {message}"),
            Self::NotFound { message } => message.clone(),
            Self::Timeout { .. } => {
                "Collecting weather data took too long. Please try again.".to_string()
            }
            Self::Io { .. } | Self::Json { .. } => {
                "An unexpected error occurred while handling the request.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = WeatherTripError::config("missing cities file");
        assert!(matches!(config_err, WeatherTripError::Config { .. }));

        let upstream_err = WeatherTripError::upstream("Bayburt", "connection refused");
        assert!(matches!(upstream_err, WeatherTripError::Upstream { .. }));
        assert!(upstream_err.is_city_scoped());

        let validation_err = WeatherTripError::validation("startDate is required");
        assert!(matches!(validation_err, WeatherTripError::Validation { .. }));
        assert!(!validation_err.is_city_scoped());
    }

    #[test]
    fn test_user_messages() {
        let upstream_err = WeatherTripError::upstream("Rize", "HTTP 503");
        assert!(upstream_err.user_message().contains("Rize"));
        assert!(!upstream_err.user_message().contains("503"));

        let validation_err = WeatherTripError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));

        let io_err: WeatherTripError =
            std::io::Error::other("stack details").into();
        assert!(!io_err.user_message().contains("stack details"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WeatherTripError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WeatherTripError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WeatherTripError::Timeout { seconds: 60 }.status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            WeatherTripError::page_structure("Van", "no table").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WeatherTripError = io_err.into();
        assert!(matches!(err, WeatherTripError::Io { .. }));
    }
}
