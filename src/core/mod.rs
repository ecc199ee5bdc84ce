pub mod analysis;
pub mod engine;
pub mod geo;
pub mod nowcast;
pub mod pipeline;
pub mod render;

pub use crate::domain::model::{FrameImage, RainEstimate, RaincastReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
