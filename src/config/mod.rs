#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::nominatim::{DEFAULT_USER_AGENT, NOMINATIM_REVERSE_URL};
use crate::adapters::rainviewer::RAIN_VIEWER_API_URL;
use crate::core::nowcast::{MAX_SWEEP_STEP_DEG, MIN_SWEEP_STEP_DEG};
use crate::domain::model::MapRequest;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use toml_config::TomlConfig;

/// Picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "raincaster.toml";

/// Fully resolved configuration: built-in defaults, then the TOML file, then
/// command-line overrides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub api_url: String,
    pub geocode_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub concurrent_requests: usize,
    pub request: MapRequest,
    pub utc_offset: i32,
    pub max_frames: Option<usize>,
    pub direction: f64,
    pub sweep_step: Option<f64>,
    pub output_path: String,
    pub archive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: RAIN_VIEWER_API_URL.to_string(),
            geocode_url: NOMINATIM_REVERSE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 100,
            concurrent_requests: 8,
            request: MapRequest::default(),
            utc_offset: 0,
            max_frames: None,
            direction: 0.0,
            sweep_step: None,
            output_path: "./output".to_string(),
            archive: true,
        }
    }
}

impl Settings {
    /// Loads `path`, or `raincaster.toml` from the working directory when it
    /// exists, on top of the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = Self::default();
        match path {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                settings.apply_toml(&TomlConfig::from_file(path)?);
            }
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                tracing::info!("📁 Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                settings.apply_toml(&TomlConfig::from_file(DEFAULT_CONFIG_FILE)?);
            }
            None => tracing::debug!("No configuration file, using defaults"),
        }
        Ok(settings)
    }

    pub fn apply_toml(&mut self, config: &TomlConfig) {
        if let Some(api) = &config.api {
            if let Some(url) = &api.url {
                self.api_url = url.clone();
            }
            if let Some(url) = &api.geocode_url {
                self.geocode_url = url.clone();
            }
            if let Some(ua) = &api.user_agent {
                self.user_agent = ua.clone();
            }
            if let Some(timeout) = api.timeout_seconds {
                self.timeout_seconds = timeout;
            }
            if let Some(n) = api.concurrent_requests {
                self.concurrent_requests = n;
            }
        }

        if let Some(location) = &config.location {
            if let Some(lat) = location.lat {
                self.request.lat = lat;
            }
            if let Some(lon) = location.lon {
                self.request.lon = lon;
            }
            if let Some(offset) = location.utc_offset {
                self.utc_offset = offset;
            }
        }

        if let Some(radar) = &config.radar {
            if let Some(zoom) = radar.zoom {
                self.request.zoom = zoom;
            }
            if let Some(size) = radar.size {
                self.request.size = size;
            }
            if let Some(color) = radar.color {
                self.request.color = color;
            }
            if let Some(options) = &radar.options {
                self.request.options = options.clone();
            }
            if radar.max_frames.is_some() {
                self.max_frames = radar.max_frames;
            }
        }

        if let Some(analysis) = &config.analysis {
            if let Some(direction) = analysis.direction {
                self.direction = direction;
            }
            if analysis.sweep_step.is_some() {
                self.sweep_step = analysis.sweep_step;
            }
        }

        if let Some(output) = &config.output {
            if let Some(path) = &output.path {
                self.output_path = path.clone();
            }
            if let Some(archive) = output.archive {
                self.archive = archive;
            }
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.url", &self.api_url)?;
        validation::validate_url("api.geocode_url", &self.geocode_url)?;
        validation::validate_non_empty_string("api.user_agent", &self.user_agent)?;
        validation::validate_positive_number("api.timeout_seconds", self.timeout_seconds as usize, 1)?;
        validation::validate_positive_number("api.concurrent_requests", self.concurrent_requests, 1)?;

        validation::validate_range("location.lat", self.request.lat, -90.0, 90.0)?;
        validation::validate_range("location.lon", self.request.lon, -180.0, 180.0)?;
        validation::validate_range("location.utc_offset", self.utc_offset, -12, 14)?;

        validation::validate_range("radar.zoom", self.request.zoom, 0, 20)?;
        validation::validate_one_of("radar.size", self.request.size, &[256, 512])?;
        validation::validate_range("radar.color", self.request.color, 0, 8)?;
        validation::validate_non_empty_string("radar.options", &self.request.options)?;
        if let Some(max_frames) = self.max_frames {
            validation::validate_positive_number("radar.max_frames", max_frames, 1)?;
        }

        validation::validate_half_open_range("analysis.direction", self.direction, 0.0, 360.0)?;
        if let Some(step) = self.sweep_step {
            validation::validate_range(
                "analysis.sweep_step",
                step,
                MIN_SWEEP_STEP_DEG,
                MAX_SWEEP_STEP_DEG,
            )?;
        }

        validation::validate_path("output.path", &self.output_path)?;
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn api_url(&self) -> &str {
        &self.api_url
    }

    fn geocode_url(&self) -> &str {
        &self.geocode_url
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn map_request(&self) -> &MapRequest {
        &self.request
    }

    fn direction_deg(&self) -> f64 {
        self.direction
    }

    fn sweep_step_deg(&self) -> Option<f64> {
        self.sweep_step
    }

    fn tz_shift_hours(&self) -> i32 {
        self.utc_offset
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn archive(&self) -> bool {
        self.archive
    }

    fn max_frames(&self) -> Option<usize> {
        self.max_frames
    }
}
