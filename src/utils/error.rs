use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaincastError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("Image decoding failed: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Geocoding error: {message}")]
    GeocodeError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RaincastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::HttpStatusError { .. } | Self::GeocodeError { .. } => {
                ErrorCategory::Network
            }
            Self::ImageError(_)
            | Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. } => ErrorCategory::Data,
            Self::ZipError(_) | Self::IoError(_) => ErrorCategory::Storage,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路錯誤通常可以重試
            Self::ApiError(_) | Self::HttpStatusError { .. } | Self::GeocodeError { .. } => {
                ErrorSeverity::Medium
            }
            Self::ImageError(_)
            | Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. } => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::High,
            Self::ZipError(_) | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ApiError(e) if e.is_timeout() => {
                "The request timed out. Increase api.timeout_seconds or retry later.".to_string()
            }
            Self::ApiError(_) => {
                "Check your network connection and that the RainViewer API is reachable."
                    .to_string()
            }
            Self::HttpStatusError { status, .. } if *status == 429 => {
                "The server is rate limiting requests. Lower api.concurrent_requests and retry."
                    .to_string()
            }
            Self::HttpStatusError { status, .. } if *status >= 500 => {
                "The server is having problems. Retry in a few minutes.".to_string()
            }
            Self::HttpStatusError { .. } => {
                "Check the API URL and the radar parameters (zoom, size, color).".to_string()
            }
            Self::ImageError(_) => {
                "The radar tile could not be decoded. Try a different size or color scheme."
                    .to_string()
            }
            Self::ZipError(_) | Self::IoError(_) => {
                "Check that the output directory exists and is writable.".to_string()
            }
            Self::CsvError(_) | Self::SerializationError(_) => {
                "The report could not be serialized. Run with --verbose for details.".to_string()
            }
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Check the TOML configuration file syntax and values.".to_string()
            }
            Self::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the config file or on the command line.", field)
            }
            Self::MissingConfigError { field } => {
                format!("Provide a value for '{}'.", field)
            }
            Self::ProcessingError { .. } => {
                "The radar frames could not be analysed. Try another direction or zoom level."
                    .to_string()
            }
            Self::GeocodeError { .. } => {
                "Reverse geocoding failed. Check the coordinates or try again later.".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Data => format!("Could not process radar data: {}", self),
            ErrorCategory::Storage => format!("Could not write output: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }

    /// Exit code used by the CLI, derived from severity.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, RaincastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_is_retryable_network_error() {
        let err = RaincastError::HttpStatusError {
            url: "https://api.rainviewer.com/public/weather-maps.json".to_string(),
            status: 503,
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.exit_code(), 2);
        assert!(err.recovery_suggestion().contains("Retry"));
    }

    #[test]
    fn test_config_errors_map_to_exit_code_one() {
        let err = RaincastError::InvalidConfigValueError {
            field: "radar.zoom".to_string(),
            value: "42".to_string(),
            reason: "Value must be between 0 and 20".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 1);
        assert!(err.recovery_suggestion().contains("radar.zoom"));
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = RaincastError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }
}
