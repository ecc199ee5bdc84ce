use crate::config::Settings;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "raincaster")]
#[command(about = "Rain radar nowcasting from RainViewer weather maps", version)]
pub struct Cli {
    /// Path to a TOML configuration file (defaults to ./raincaster.toml when present)
    #[arg(short, long, global = true, env = "RAINCASTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Log CPU and memory usage per phase
    #[arg(long, global = true)]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download frames, estimate rain arrival and save the results
    Run(RunArgs),
    /// List the radar frames currently available
    Maps(MapsArgs),
    /// Print the rain arrival estimate without writing files
    Estimate(EstimateArgs),
    /// Reverse-geocode a coordinate into a street address
    Locate(LocateArgs),
    /// Print the ground size of one map tile
    TileSize(TileSizeArgs),
    /// Remove generated outputs (missing files are fine)
    Clean(CleanArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ApiArgs {
    /// Weather maps index URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum parallel tile downloads
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct LocationArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Hours from UTC for displayed times
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<i32>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RadarArgs {
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Tile size in pixels (256 or 512)
    #[arg(long)]
    pub size: Option<u32>,

    /// RainViewer color scheme
    #[arg(long)]
    pub color: Option<u8>,

    /// `{smooth}_{snow}` rendering options
    #[arg(long)]
    pub options: Option<String>,

    /// Keep only the most recent N past frames
    #[arg(long)]
    pub max_frames: Option<usize>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct AnalysisArgs {
    /// Direction to look for incoming rain, degrees (0 = east, 90 = south)
    #[arg(long)]
    pub direction: Option<f64>,

    /// Scan all directions in steps of this many degrees (1 to 180)
    #[arg(long)]
    pub sweep: Option<f64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Output directory
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub api: ApiArgs,
    #[command(flatten)]
    pub location: LocationArgs,
    #[command(flatten)]
    pub radar: RadarArgs,
    #[command(flatten)]
    pub analysis: AnalysisArgs,
    #[command(flatten)]
    pub output: OutputArgs,

    /// Write loose files instead of a ZIP archive
    #[arg(long)]
    pub no_archive: bool,

    /// Show what would be processed without downloading anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct MapsArgs {
    #[command(flatten)]
    pub api: ApiArgs,
    #[command(flatten)]
    pub location: LocationArgs,
    #[command(flatten)]
    pub radar: RadarArgs,
}

#[derive(Debug, Clone, Args)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub api: ApiArgs,
    #[command(flatten)]
    pub location: LocationArgs,
    #[command(flatten)]
    pub radar: RadarArgs,
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Debug, Clone, Args)]
pub struct LocateArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Reverse geocoding endpoint
    #[arg(long)]
    pub geocode_url: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TileSizeArgs {
    #[arg(long)]
    pub zoom: u8,

    /// Latitude in degrees; the equator when omitted
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub lat: f64,
}

#[derive(Debug, Clone, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}

impl ApiArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.api_url {
            settings.api_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_seconds = timeout;
        }
        if let Some(n) = self.concurrency {
            settings.concurrent_requests = n;
        }
    }
}

impl LocationArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(lat) = self.lat {
            settings.request.lat = lat;
        }
        if let Some(lon) = self.lon {
            settings.request.lon = lon;
        }
        if let Some(offset) = self.utc_offset {
            settings.utc_offset = offset;
        }
    }
}

impl RadarArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(zoom) = self.zoom {
            settings.request.zoom = zoom;
        }
        if let Some(size) = self.size {
            settings.request.size = size;
        }
        if let Some(color) = self.color {
            settings.request.color = color;
        }
        if let Some(options) = &self.options {
            settings.request.options = options.clone();
        }
        if self.max_frames.is_some() {
            settings.max_frames = self.max_frames;
        }
    }
}

impl AnalysisArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(direction) = self.direction {
            settings.direction = direction;
        }
        if self.sweep.is_some() {
            settings.sweep_step = self.sweep;
        }
    }
}

impl OutputArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.output {
            settings.output_path = path.clone();
        }
    }
}

impl RunArgs {
    pub fn apply(&self, settings: &mut Settings) {
        self.api.apply(settings);
        self.location.apply(settings);
        self.radar.apply(settings);
        self.analysis.apply(settings);
        self.output.apply(settings);
        if self.no_archive {
            settings.archive = false;
        }
    }
}
