use crate::domain::model::{FrameImage, MapRequest, RaincastReport};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Returns `false` when there was nothing to remove.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
    /// Returns `false` when there was nothing to remove.
    fn remove_dir_all(&self, path: &str)
        -> impl std::future::Future<Output = Result<bool>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_url(&self) -> &str;
    fn geocode_url(&self) -> &str;
    fn user_agent(&self) -> &str;
    fn timeout(&self) -> Duration;
    fn concurrent_requests(&self) -> usize;
    fn map_request(&self) -> &MapRequest;
    fn direction_deg(&self) -> f64;
    /// `Some(step)` runs a full sweep instead of a single direction.
    fn sweep_step_deg(&self) -> Option<f64>;
    fn tz_shift_hours(&self) -> i32;
    fn output_path(&self) -> &str;
    fn archive(&self) -> bool;
    /// Keep only the most recent `n` past frames.
    fn max_frames(&self) -> Option<usize>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<FrameImage>>;
    async fn transform(&self, frames: Vec<FrameImage>) -> Result<RaincastReport>;
    async fn load(&self, report: RaincastReport) -> Result<String>;
}
