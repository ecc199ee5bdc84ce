use chrono::{DateTime, FixedOffset, Offset, Utc};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A single map frame from the RainViewer index.
///
/// `time` is the frame generation time (UNIX seconds, UTC). A frame usually
/// combines images from slightly different times, so this is not the exact
/// observation time of every pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarFrame {
    pub time: i64,
    pub path: String,
}

impl RadarFrame {
    pub fn time_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.time, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Frame time in a fixed `UTC+tz_shift` zone. Offsets outside ±23h fall back to UTC.
    pub fn time_with_offset(&self, tz_shift_hours: i32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(tz_shift_hours * 3600).unwrap_or_else(|| Utc.fix());
        self.time_utc().with_timezone(&offset)
    }

    /// `HH:MM:SS` in the shifted zone.
    pub fn time_str(&self, tz_shift_hours: i32) -> String {
        self.time_with_offset(tz_shift_hours)
            .format("%H:%M:%S")
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Radar {
    #[serde(default)]
    pub past: Vec<RadarFrame>,
    #[serde(default)]
    pub nowcast: Vec<RadarFrame>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Satellite {
    #[serde(default)]
    pub infrared: Vec<RadarFrame>,
}

/// The RainViewer `weather-maps.json` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherMaps {
    pub version: String,
    pub generated: i64,
    pub host: String,
    #[serde(default)]
    pub radar: Radar,
    #[serde(default)]
    pub satellite: Satellite,
}

impl WeatherMaps {
    pub fn num_past_radar_frames(&self) -> usize {
        self.radar.past.len()
    }

    pub fn num_nowcast_radar_frames(&self) -> usize {
        self.radar.nowcast.len()
    }

    /// Past frames followed by nowcast frames, in API order.
    pub fn frames(&self) -> Vec<(FrameKind, RadarFrame)> {
        self.radar
            .past
            .iter()
            .map(|f| (FrameKind::Past, f.clone()))
            .chain(
                self.radar
                    .nowcast
                    .iter()
                    .map(|f| (FrameKind::Nowcast, f.clone())),
            )
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Past,
    Nowcast,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Past => write!(f, "past"),
            FrameKind::Nowcast => write!(f, "nowcast"),
        }
    }
}

/// A downloaded radar image together with its frame.
#[derive(Debug, Clone)]
pub struct FrameImage {
    pub frame: RadarFrame,
    pub kind: FrameKind,
    pub image: RgbaImage,
}

/// Query parameters for one radar tile centred on a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRequest {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
    pub size: u32,
    pub color: u8,
    pub options: String,
}

impl Default for MapRequest {
    fn default() -> Self {
        Self {
            lat: 50.061,
            lon: 19.938,
            zoom: 7,
            size: 512,
            color: 2,
            options: "1_0".to_string(),
        }
    }
}

/// Outcome of the rain arrival estimate for one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainEstimate {
    pub direction_deg: f64,
    /// Number of consecutive frames the fit used.
    pub samples: usize,
    /// `None` when there are too few samples or the rain is not approaching.
    pub minutes_to_arrival: Option<f64>,
    pub correlation: Option<f64>,
    pub distance_px: Option<f64>,
    pub distance_km: Option<f64>,
    pub speed_kmh: Option<f64>,
}

impl RainEstimate {
    pub fn insufficient(direction_deg: f64, samples: usize) -> Self {
        Self {
            direction_deg,
            samples,
            minutes_to_arrival: None,
            correlation: None,
            distance_px: None,
            distance_km: None,
            speed_kmh: None,
        }
    }

    pub fn is_approaching(&self) -> bool {
        self.minutes_to_arrival.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub time: i64,
    pub local_time: String,
    pub kind: FrameKind,
    /// Fraction of pixels at or above the rain threshold.
    pub rain_coverage: f64,
}

/// One sample along the cross-section of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub time: i64,
    pub kind: FrameKind,
    pub distance_px: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaincastReport {
    pub generated: i64,
    pub host: String,
    pub request: MapRequest,
    pub tile_size_km: f64,
    pub frames: Vec<FrameSummary>,
    /// The estimate for the configured direction, or the soonest one from a sweep.
    pub estimate: RainEstimate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sweep: Vec<RainEstimate>,
    #[serde(skip)]
    pub profile: Vec<ProfileRow>,
    /// Rendered PNGs keyed by frame time.
    #[serde(skip)]
    pub rendered: Vec<(i64, Vec<u8>)>,
}
