pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::nominatim::GeocodeClient;
pub use adapters::rainviewer::RainViewerClient;
pub use adapters::storage::LocalStorage;
pub use config::Settings;
pub use core::{engine::RaincastEngine, pipeline::RadarPipeline};
pub use utils::error::{RaincastError, Result};
