//! RainViewer Weather Maps API client.
//!
//! See <https://www.rainviewer.com/api/weather-maps-api.html>.

use crate::core::render::decode_png;
use crate::domain::model::{FrameImage, FrameKind, MapRequest, RadarFrame, WeatherMaps};
use crate::utils::error::{RaincastError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use image::RgbaImage;
use reqwest::Client;
use std::time::Duration;

pub const RAIN_VIEWER_API_URL: &str = "https://api.rainviewer.com/public/weather-maps.json";

#[derive(Debug, Clone)]
pub struct RainViewerClient {
    client: Client,
    api_url: String,
}

impl RainViewerClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub async fn fetch_weather_maps(&self) -> Result<WeatherMaps> {
        tracing::debug!("Fetching weather maps index from {}", self.api_url);
        let response = self.client.get(&self.api_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RaincastError::HttpStatusError {
                url: self.api_url.clone(),
                status: status.as_u16(),
            });
        }

        let maps: WeatherMaps = response.json().await?;
        tracing::debug!(
            "Weather maps v{}: {} past, {} nowcast frames on {}",
            maps.version,
            maps.num_past_radar_frames(),
            maps.num_nowcast_radar_frames(),
            maps.host
        );
        Ok(maps)
    }

    pub async fn fetch_radar_image(
        &self,
        host: &str,
        frame: &RadarFrame,
        request: &MapRequest,
    ) -> Result<RgbaImage> {
        let url = radar_tile_url(host, frame, request);
        tracing::debug!("Downloading radar tile {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RaincastError::HttpStatusError {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        decode_png(&bytes)
    }

    /// Downloads `frames` with at most `concurrency` requests in flight.
    /// Output order matches input order; the first failure aborts the batch.
    pub async fn fetch_frames(
        &self,
        host: &str,
        frames: Vec<(FrameKind, RadarFrame)>,
        request: &MapRequest,
        concurrency: usize,
    ) -> Result<Vec<FrameImage>> {
        stream::iter(frames)
            .map(|(kind, frame)| async move {
                let image = self.fetch_radar_image(host, &frame, request).await?;
                Ok::<_, RaincastError>(FrameImage { frame, kind, image })
            })
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }

    /// Downloads every past and nowcast radar frame of `maps`.
    pub async fn fetch_all_radar_maps(
        &self,
        maps: &WeatherMaps,
        request: &MapRequest,
        concurrency: usize,
    ) -> Result<Vec<FrameImage>> {
        self.fetch_frames(&maps.host, maps.frames(), request, concurrency)
            .await
    }
}

/// `{host}/{path}/{size}/{zoom}/{lat}/{lon}/{color}/{options}.png`
pub fn radar_tile_url(host: &str, frame: &RadarFrame, request: &MapRequest) -> String {
    format!(
        "{}/{}/{}/{}/{}/{}/{}/{}.png",
        host.trim_end_matches('/'),
        frame.path.trim_matches('/'),
        request.size,
        request.zoom,
        request.lat,
        request.lon,
        request.color,
        request.options
    )
}
