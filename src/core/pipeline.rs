use crate::adapters::rainviewer::RainViewerClient;
use crate::core::analysis::{cross_section, rain_coverage, IntensityGrid, RAIN_THRESHOLD};
use crate::core::geo::tile_size_km;
use crate::core::nowcast::{estimate_from_grids, frame_grids, soonest, sweep};
use crate::core::render::{encode_png, render_frame};
use crate::domain::model::{
    FrameImage, FrameKind, FrameSummary, ProfileRow, RainEstimate, RaincastReport,
};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{RaincastError, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ARCHIVE_NAME: &str = "raincast.zip";
pub const REPORT_NAME: &str = "report.json";
pub const PROFILE_NAME: &str = "profile.csv";
pub const FRAMES_DIR: &str = "frames";

/// Index metadata kept from `extract` for the report.
#[derive(Debug, Clone)]
struct IndexInfo {
    generated: i64,
    host: String,
}

pub struct RadarPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: RainViewerClient,
    index: Mutex<Option<IndexInfo>>,
    now: Option<i64>,
}

impl<S: Storage, C: ConfigProvider> RadarPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = RainViewerClient::new(config.api_url(), config.timeout())?;
        Ok(Self {
            storage,
            config,
            client,
            index: Mutex::new(None),
            now: None,
        })
    }

    /// Pins the reference time used for arrival estimates.
    pub fn with_clock(mut self, now: i64) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> i64 {
        self.now.unwrap_or_else(|| chrono::Utc::now().timestamp())
    }

    fn index_info(&self) -> Result<Option<IndexInfo>> {
        self.index
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| RaincastError::ProcessingError {
                message: "index state lock poisoned".to_string(),
            })
    }

    fn estimate(&self, past: &[FrameImage], km_per_px: f64) -> (RainEstimate, Vec<RainEstimate>) {
        let now = self.now();
        let direction = self.config.direction_deg();

        match self.config.sweep_step_deg() {
            Some(step) => {
                let results = sweep(past, step, now, km_per_px);
                let headline = soonest(&results)
                    .or_else(|| results.iter().max_by_key(|e| e.samples))
                    .cloned()
                    .unwrap_or_else(|| RainEstimate::insufficient(direction, 0));
                (headline, results)
            }
            None => {
                let grids = frame_grids(past);
                (estimate_from_grids(&grids, direction, now, km_per_px), Vec::new())
            }
        }
    }

    fn profile_csv(rows: &[ProfileRow]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| RaincastError::ProcessingError {
                message: format!("Failed to finish CSV output: {}", e),
            })
    }

    /// Every output file as `(relative path, bytes)`.
    fn output_files(report: &RaincastReport) -> Result<Vec<(String, Vec<u8>)>> {
        let mut files = vec![
            (REPORT_NAME.to_string(), serde_json::to_vec_pretty(report)?),
            (PROFILE_NAME.to_string(), Self::profile_csv(&report.profile)?),
        ];
        for (time, png) in &report.rendered {
            files.push((format!("{}/{}.png", FRAMES_DIR, time), png.clone()));
        }
        Ok(files)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for RadarPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<FrameImage>> {
        let maps = self.client.fetch_weather_maps().await?;

        let mut frames = maps.frames();
        if let Some(max) = self.config.max_frames() {
            let past = maps.num_past_radar_frames();
            if past > max {
                tracing::debug!("Keeping the last {} of {} past frames", max, past);
                frames.drain(..past - max);
            }
        }

        {
            let mut index = self
                .index
                .lock()
                .map_err(|_| RaincastError::ProcessingError {
                    message: "index state lock poisoned".to_string(),
                })?;
            *index = Some(IndexInfo {
                generated: maps.generated,
                host: maps.host.clone(),
            });
        }

        tracing::info!(
            "📡 Downloading {} radar frames from {}",
            frames.len(),
            maps.host
        );
        self.client
            .fetch_frames(
                &maps.host,
                frames,
                self.config.map_request(),
                self.config.concurrent_requests(),
            )
            .await
    }

    async fn transform(&self, frames: Vec<FrameImage>) -> Result<RaincastReport> {
        let request = self.config.map_request().clone();
        let tile_km = tile_size_km(request.zoom, request.lat);
        let km_per_px = if request.size > 0 {
            tile_km / f64::from(request.size)
        } else {
            0.0
        };
        let tz_shift = self.config.tz_shift_hours();

        let summaries: Vec<FrameSummary> = frames
            .iter()
            .map(|f| FrameSummary {
                time: f.frame.time,
                local_time: f.frame.time_str(tz_shift),
                kind: f.kind,
                rain_coverage: rain_coverage(&IntensityGrid::from_rgba(&f.image), RAIN_THRESHOLD),
            })
            .collect();

        // 只用已觀測的幀估計移動
        let past: Vec<FrameImage> = frames
            .iter()
            .filter(|f| f.kind == FrameKind::Past)
            .cloned()
            .collect();
        let (estimate, sweep_results) = self.estimate(&past, km_per_px);

        let profile = match past.last() {
            Some(last) => {
                let section =
                    cross_section(&IntensityGrid::from_rgba(&last.image), estimate.direction_deg);
                section
                    .distances
                    .iter()
                    .zip(&section.values)
                    .map(|(&distance_px, &value)| ProfileRow {
                        time: last.frame.time,
                        kind: last.kind,
                        distance_px,
                        value,
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        let mut rendered = Vec::with_capacity(frames.len());
        for f in &frames {
            let frame = render_frame(&f.image, tile_km, Some(estimate.direction_deg));
            rendered.push((f.frame.time, encode_png(&frame)?));
        }

        let (generated, host) = match self.index_info()? {
            Some(info) => (info.generated, info.host),
            None => (self.now(), String::new()),
        };

        Ok(RaincastReport {
            generated,
            host,
            request,
            tile_size_km: tile_km,
            frames: summaries,
            estimate,
            sweep: sweep_results,
            profile,
            rendered,
        })
    }

    async fn load(&self, report: RaincastReport) -> Result<String> {
        let files = Self::output_files(&report)?;
        let base = Path::new(self.config.output_path());

        if !self.config.archive() {
            tracing::debug!("Writing {} files to {}", files.len(), base.display());
            for (path, data) in &files {
                self.storage.write_file(path, data).await?;
            }
            return Ok(base.display().to_string());
        }

        tracing::debug!("Creating ZIP archive with {} files", files.len());
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (path, data) in &files {
                zip.start_file(path.as_str(), SimpleFileOptions::default())?;
                zip.write_all(data)?;
            }
            zip.finish()?.into_inner()
        };

        tracing::debug!("Writing ZIP archive ({} bytes) to storage", zip_data.len());
        self.storage.write_file(ARCHIVE_NAME, &zip_data).await?;

        Ok(base.join(ARCHIVE_NAME).display().to_string())
    }
}

/// Removes every generated output. Paths that do not exist are skipped, so
/// repeated calls succeed. Returns the paths that were actually removed.
pub async fn clean_outputs<S: Storage>(storage: &S) -> Result<Vec<&'static str>> {
    let mut removed = Vec::new();
    for name in [ARCHIVE_NAME, REPORT_NAME, PROFILE_NAME] {
        if storage.remove_file(name).await? {
            removed.push(name);
        }
    }
    if storage.remove_dir_all(FRAMES_DIR).await? {
        removed.push(FRAMES_DIR);
    }
    Ok(removed)
}
