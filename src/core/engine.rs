use crate::domain::model::RainEstimate;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: String,
    pub frames: usize,
    pub estimate: RainEstimate,
    pub sweep: Vec<RainEstimate>,
}

pub struct RaincastEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> RaincastEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting raincast run");
        self.monitor.log_stats("Start");

        tracing::info!("📥 Extracting radar frames...");
        let frames = self.pipeline.extract().await?;
        tracing::info!("Extracted {} frames", frames.len());
        self.monitor.log_stats("Extract");

        tracing::info!("🛠️ Analysing frames...");
        let report = self.pipeline.transform(frames).await?;
        tracing::info!(
            "Analysed {} frames, estimate from {} samples",
            report.frames.len(),
            report.estimate.samples
        );
        self.monitor.log_stats("Transform");

        let frame_count = report.frames.len();
        let estimate = report.estimate.clone();
        let sweep = report.sweep.clone();

        tracing::info!("💾 Saving results...");
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunSummary {
            output_path,
            frames: frame_count,
            estimate,
            sweep,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FrameImage, MapRequest, RaincastReport};
    use crate::utils::error::RaincastError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        calls: AtomicUsize,
        fail_transform: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<Vec<FrameImage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn transform(&self, _frames: Vec<FrameImage>) -> Result<RaincastReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_transform {
                return Err(RaincastError::ProcessingError {
                    message: "boom".to_string(),
                });
            }
            Ok(RaincastReport {
                generated: 0,
                host: String::new(),
                request: MapRequest::default(),
                tile_size_km: 1.0,
                frames: Vec::new(),
                estimate: RainEstimate::insufficient(90.0, 2),
                sweep: Vec::new(),
                profile: Vec::new(),
                rendered: Vec::new(),
            })
        }

        async fn load(&self, _report: RaincastReport) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("out/raincast.zip".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_executes_all_phases() {
        let engine = RaincastEngine::new(CountingPipeline {
            calls: AtomicUsize::new(0),
            fail_transform: false,
        });

        let summary = engine.run().await.unwrap();
        assert_eq!(summary.output_path, "out/raincast.zip");
        assert_eq!(summary.estimate.direction_deg, 90.0);
        assert_eq!(summary.estimate.samples, 2);
        assert_eq!(engine.pipeline().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_stops_at_first_failure() {
        let engine = RaincastEngine::new_with_monitoring(
            CountingPipeline {
                calls: AtomicUsize::new(0),
                fail_transform: true,
            },
            false,
        );

        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, RaincastError::ProcessingError { .. }));
        assert_eq!(engine.pipeline().calls.load(Ordering::SeqCst), 2);
    }
}
