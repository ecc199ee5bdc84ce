#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Resource usage of this process at the end of one pipeline phase.
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseSample {
    pub phase: String,
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub memory_percent: f32,
    pub peak_memory_mb: u64,
    /// Time since the monitor was created.
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
#[derive(Debug, Default)]
struct MonitorState {
    peak_memory_mb: u64,
    samples: Vec<PhaseSample>,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    enabled: bool,
    pid: Option<Pid>,
    system: Mutex<System>,
    state: Mutex<MonitorState>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = if enabled {
            sysinfo::get_current_pid()
                .map_err(|e| tracing::warn!("System monitoring unavailable: {}", e))
                .ok()
        } else {
            None
        };

        Self {
            enabled,
            pid,
            system: Mutex::new(System::new()),
            state: Mutex::new(MonitorState::default()),
            started: Instant::now(),
        }
    }

    /// Refreshes this process only and records the result under `phase`.
    pub fn sample(&self, phase: &str) -> Option<PhaseSample> {
        let pid = self.pid.filter(|_| self.enabled)?;

        let (cpu_usage, memory_mb, total_mb) = {
            let mut system = self.system.lock().ok()?;
            system.refresh_memory();
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            let process = system.process(pid)?;
            (
                process.cpu_usage(),
                process.memory() / 1024 / 1024,
                system.total_memory() / 1024 / 1024,
            )
        };

        let mut state = self.state.lock().ok()?;
        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);

        let sample = PhaseSample {
            phase: phase.to_string(),
            cpu_usage,
            memory_mb,
            memory_percent: if total_mb > 0 {
                memory_mb as f32 / total_mb as f32 * 100.0
            } else {
                0.0
            },
            peak_memory_mb: state.peak_memory_mb,
            elapsed: self.started.elapsed(),
        };
        state.samples.push(sample.clone());
        Some(sample)
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(s) = self.sample(phase) {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Time: {:?}",
                s.phase,
                s.cpu_usage,
                s.memory_mb,
                s.memory_percent,
                s.peak_memory_mb,
                s.elapsed
            );
        }
    }

    /// Logs the total time, peak memory and the phase that took longest.
    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let Ok(state) = self.state.lock() else {
            return;
        };

        let slowest = state
            .samples
            .iter()
            .scan(Duration::ZERO, |prev, s| {
                let took = s.elapsed.saturating_sub(*prev);
                *prev = s.elapsed;
                Some((s.phase.as_str(), took))
            })
            .max_by_key(|(_, took)| *took);

        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
            self.started.elapsed(),
            state.peak_memory_mb
        );
        if let Some((phase, took)) = slowest {
            tracing::info!("📊 Slowest phase: {} ({:?})", phase, took);
        }
    }

    pub fn samples(&self) -> Vec<PhaseSample> {
        self.state
            .lock()
            .map(|state| state.samples.clone())
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.sample("Extract").is_none());
        assert!(monitor.samples().is_empty());
    }

    #[test]
    fn test_enabled_monitor_tracks_phases_and_peak() {
        let monitor = SystemMonitor::new(true);
        let Some(first) = monitor.sample("Extract") else {
            // no process information on this platform
            return;
        };
        let second = monitor.sample("Transform").unwrap();

        assert!(second.peak_memory_mb >= first.memory_mb);
        assert!(second.elapsed >= first.elapsed);
        let phases: Vec<String> = monitor.samples().into_iter().map(|s| s.phase).collect();
        assert_eq!(phases, vec!["Extract", "Transform"]);
        monitor.log_final_stats();
    }
}
