use crate::core::analysis::{
    cluster_rain_regions, cross_section, find_first_above_threshold, simplify_rain_regions,
    CrossSection, IntensityGrid, MASK_THRESHOLD, RAIN_THRESHOLD,
};
use crate::domain::model::{FrameImage, RainEstimate};

/// Minimum number of consecutive frames needed for a fit.
pub const MIN_SAMPLES: usize = 3;
/// Only the most recent frames are fitted.
pub const MAX_SAMPLES: usize = 5;
/// Finest sweep resolution; smaller steps are raised to this.
pub const MIN_SWEEP_STEP_DEG: f64 = 1.0;
/// Coarsest sweep resolution accepted by configuration.
pub const MAX_SWEEP_STEP_DEG: f64 = 180.0;

/// Least-squares line `distance = slope * t + intercept` over the samples.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// Pixels per second. Negative means the rain is approaching.
    pub slope: f64,
    pub intercept: f64,
    pub correlation: f64,
    /// Seconds from `now` until the front reaches the centre.
    pub seconds_to_arrival: Option<f64>,
}

/// Fits distance against time and extrapolates when the distance reaches zero.
///
/// Returns `None` with fewer than two samples or when all timestamps are equal.
pub fn fit_time_to_rain(timestamps: &[i64], distances: &[f64], now: i64) -> Option<LinearFit> {
    let n = timestamps.len().min(distances.len());
    if n < 2 {
        return None;
    }

    let ts: Vec<f64> = timestamps[..n].iter().map(|&t| t as f64).collect();
    let ds = &distances[..n];

    let mean_t = ts.iter().sum::<f64>() / n as f64;
    let mean_d = ds.iter().sum::<f64>() / n as f64;

    let (mut s_tt, mut s_dd, mut s_td) = (0.0, 0.0, 0.0);
    for (t, d) in ts.iter().zip(ds) {
        let (dt, dd) = (t - mean_t, d - mean_d);
        s_tt += dt * dt;
        s_dd += dd * dd;
        s_td += dt * dd;
    }

    if s_tt == 0.0 {
        return None;
    }

    let slope = s_td / s_tt;
    let intercept = mean_d - slope * mean_t;
    let correlation = if s_dd == 0.0 {
        0.0
    } else {
        s_td / (s_tt * s_dd).sqrt()
    };

    let seconds_to_arrival = (slope < 0.0).then(|| {
        let last_t = ts[n - 1];
        let time_to_arrive = -ds[n - 1] / slope;
        last_t + time_to_arrive - now as f64
    });

    Some(LinearFit {
        slope,
        intercept,
        correlation,
        seconds_to_arrival,
    })
}

/// Intensity grids for a frame sequence, computed once and shared across directions.
pub fn frame_grids(frames: &[FrameImage]) -> Vec<(i64, IntensityGrid)> {
    frames
        .iter()
        .map(|f| (f.frame.time, IntensityGrid::from_rgba(&f.image)))
        .collect()
}

/// Estimates when rain coming from `angle_deg` reaches the image centre.
///
/// `km_per_px` converts pixel distances for the report; pass 0.0 to skip.
pub fn estimate_time_to_rain_start(
    frames: &[FrameImage],
    angle_deg: f64,
    now: i64,
    km_per_px: f64,
) -> RainEstimate {
    estimate_from_grids(&frame_grids(frames), angle_deg, now, km_per_px)
}

pub fn estimate_from_grids(
    grids: &[(i64, IntensityGrid)],
    angle_deg: f64,
    now: i64,
    km_per_px: f64,
) -> RainEstimate {
    if grids.is_empty() {
        return RainEstimate::insufficient(angle_deg, 0);
    }

    let sections: Vec<(i64, CrossSection)> = grids
        .iter()
        .map(|(time, grid)| (*time, cross_section(grid, angle_deg)))
        .collect();

    // 一個沒有雨的剖面計為大小 0
    let mut sizes = Vec::new();
    for (_, section) in &sections {
        let clusters = cluster_rain_regions(&section.values, RAIN_THRESHOLD);
        if clusters.is_empty() {
            sizes.push(0);
        } else {
            sizes.extend(clusters.iter().map(Vec::len));
        }
    }
    let min_cluster_size = 0.5 * sizes.iter().sum::<usize>() as f64 / sizes.len() as f64;
    tracing::debug!(
        "Direction {:.0}°: mean rain cluster size {:.2}",
        angle_deg,
        min_cluster_size
    );

    let mut timestamps: Vec<i64> = Vec::new();
    let mut distances: Vec<f64> = Vec::new();

    for (time, section) in &sections {
        let mask = simplify_rain_regions(&section.values, min_cluster_size, RAIN_THRESHOLD);
        let first = find_first_above_threshold(&mask, MASK_THRESHOLD)
            .map(|i| section.distances[i])
            .filter(|&d| d >= 1.0);

        match first {
            Some(distance) => {
                timestamps.push(*time);
                distances.push(distance);
            }
            // 無雨或雨已到達中心：重新開始序列
            None => {
                timestamps.clear();
                distances.clear();
            }
        }
    }

    if timestamps.len() < MIN_SAMPLES {
        return RainEstimate::insufficient(angle_deg, timestamps.len());
    }

    if timestamps.len() > MAX_SAMPLES {
        tracing::debug!(
            "{} consecutive samples, fitting only the last {}",
            timestamps.len(),
            MAX_SAMPLES
        );
        let skip = timestamps.len() - MAX_SAMPLES;
        timestamps.drain(..skip);
        distances.drain(..skip);
    }

    let samples = timestamps.len();
    let Some(fit) = fit_time_to_rain(&timestamps, &distances, now) else {
        return RainEstimate::insufficient(angle_deg, samples);
    };

    let last_distance = distances[samples - 1];
    let to_km = |px: f64| (km_per_px > 0.0).then(|| px * km_per_px);

    RainEstimate {
        direction_deg: angle_deg,
        samples,
        minutes_to_arrival: fit.seconds_to_arrival.map(|s| s / 60.0),
        correlation: Some(fit.correlation),
        distance_px: Some(last_distance),
        distance_km: to_km(last_distance),
        speed_kmh: if fit.slope < 0.0 {
            to_km(-fit.slope * 3600.0)
        } else {
            None
        },
    }
}

/// Runs the estimate for every direction `0, step, 2*step, ...` below 360°.
/// Steps below [`MIN_SWEEP_STEP_DEG`] are raised to it; non-positive or NaN
/// steps give no directions.
pub fn sweep(frames: &[FrameImage], step_deg: f64, now: i64, km_per_px: f64) -> Vec<RainEstimate> {
    if step_deg.is_nan() || step_deg <= 0.0 {
        return Vec::new();
    }
    let step_deg = step_deg.max(MIN_SWEEP_STEP_DEG);
    let grids = frame_grids(frames);
    let steps = (360.0 / step_deg).ceil() as usize;
    (0..steps)
        .map(|i| i as f64 * step_deg)
        .filter(|&angle| angle < 360.0)
        .map(|angle| estimate_from_grids(&grids, angle, now, km_per_px))
        .collect()
}

/// The estimate with the earliest arrival still in the future.
pub fn soonest(estimates: &[RainEstimate]) -> Option<&RainEstimate> {
    estimates
        .iter()
        .filter(|e| e.minutes_to_arrival.is_some_and(|m| m > 0.0))
        .min_by(|a, b| {
            let (a, b) = (
                a.minutes_to_arrival.unwrap_or(f64::INFINITY),
                b.minutes_to_arrival.unwrap_or(f64::INFINITY),
            );
            a.total_cmp(&b)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FrameKind, RadarFrame};
    use image::{Rgba, RgbaImage};

    const T0: i64 = 1_700_000_000;
    const SIZE: u32 = 64;

    /// A vertical rain band `offset` pixels east of the centre, 7 px wide.
    fn band_frame(time: i64, offset: u32) -> FrameImage {
        let mut image = RgbaImage::from_pixel(SIZE, SIZE, Rgba([0, 0, 0, 0]));
        let start = SIZE / 2 + offset;
        for x in start..(start + 7).min(SIZE) {
            for y in 0..SIZE {
                image.put_pixel(x, y, Rgba([0, 120, 255, 255]));
            }
        }
        FrameImage {
            frame: RadarFrame {
                time,
                path: format!("/v2/radar/{}", time),
            },
            kind: FrameKind::Past,
            image,
        }
    }

    fn series(offsets: &[u32]) -> Vec<FrameImage> {
        offsets
            .iter()
            .enumerate()
            .map(|(i, &d)| band_frame(T0 + 600 * i as i64, d))
            .collect()
    }

    #[test]
    fn test_fit_time_to_rain_linear_approach() {
        let fit = fit_time_to_rain(&[0, 60, 120], &[30.0, 20.0, 10.0], 120).unwrap();
        assert!((fit.slope + 1.0 / 6.0).abs() < 1e-12);
        assert!((fit.correlation + 1.0).abs() < 1e-12);
        assert!((fit.seconds_to_arrival.unwrap() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_time_to_rain_receding_has_no_arrival() {
        let fit = fit_time_to_rain(&[0, 60, 120], &[10.0, 20.0, 30.0], 120).unwrap();
        assert!(fit.slope > 0.0);
        assert!(fit.seconds_to_arrival.is_none());
    }

    #[test]
    fn test_fit_time_to_rain_degenerate_inputs() {
        assert!(fit_time_to_rain(&[5], &[1.0], 0).is_none());
        assert!(fit_time_to_rain(&[5, 5, 5], &[1.0, 2.0, 3.0], 0).is_none());
        let flat = fit_time_to_rain(&[0, 1, 2], &[4.0, 4.0, 4.0], 2).unwrap();
        assert_eq!(flat.correlation, 0.0);
        assert!(flat.seconds_to_arrival.is_none());
    }

    #[test]
    fn test_estimate_approaching_band() {
        let frames = series(&[20, 16, 12, 8]);
        let now = T0 + 1800;
        let estimate = estimate_time_to_rain_start(&frames, 0.0, now, 0.5);

        assert_eq!(estimate.samples, 4);
        assert!((estimate.minutes_to_arrival.unwrap() - 20.0).abs() < 1e-6);
        assert!((estimate.correlation.unwrap() + 1.0).abs() < 1e-9);
        assert_eq!(estimate.distance_px, Some(8.0));
        assert_eq!(estimate.distance_km, Some(4.0));
        // 4 px per 10 min at 0.5 km/px → 12 km/h
        assert!((estimate.speed_kmh.unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_uses_last_five_samples() {
        let frames = series(&[25, 22, 19, 16, 13, 10, 7]);
        let now = T0 + 600 * 6;
        let estimate = estimate_time_to_rain_start(&frames, 0.0, now, 0.0);

        assert_eq!(estimate.samples, MAX_SAMPLES);
        // 7 px left at 3 px per 600 s
        assert!((estimate.minutes_to_arrival.unwrap() - 1400.0 / 60.0).abs() < 1e-6);
        assert_eq!(estimate.distance_km, None);
    }

    #[test]
    fn test_estimate_needs_three_frames() {
        let estimate = estimate_time_to_rain_start(&series(&[20, 16]), 0.0, T0, 1.0);
        assert_eq!(estimate.samples, 2);
        assert!(estimate.minutes_to_arrival.is_none());
        assert!(estimate.correlation.is_none());
    }

    #[test]
    fn test_estimate_resets_when_rain_reaches_centre() {
        let estimate = estimate_time_to_rain_start(&series(&[20, 16, 12, 0]), 0.0, T0, 1.0);
        assert_eq!(estimate.samples, 0);
        assert!(!estimate.is_approaching());
    }

    #[test]
    fn test_estimate_receding_band() {
        let estimate = estimate_time_to_rain_start(&series(&[8, 12, 16, 20]), 0.0, T0, 1.0);
        assert_eq!(estimate.samples, 4);
        assert!(estimate.minutes_to_arrival.is_none());
        assert!(estimate.speed_kmh.is_none());
        assert!((estimate.correlation.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_without_frames() {
        let estimate = estimate_time_to_rain_start(&[], 45.0, T0, 1.0);
        assert_eq!(estimate.direction_deg, 45.0);
        assert_eq!(estimate.samples, 0);
    }

    #[test]
    fn test_sweep_finds_the_rainy_direction() {
        let frames = series(&[20, 16, 12, 8]);
        let results = sweep(&frames, 90.0, T0 + 1800, 1.0);

        let directions: Vec<f64> = results.iter().map(|e| e.direction_deg).collect();
        assert_eq!(directions, vec![0.0, 90.0, 180.0, 270.0]);

        let best = soonest(&results).unwrap();
        assert_eq!(best.direction_deg, 0.0);
        assert!(results[2].minutes_to_arrival.is_none());
    }

    #[test]
    fn test_sweep_step_is_bounded() {
        let finest = sweep(&[], 1e-300, T0, 1.0);
        assert_eq!(finest.len(), 360);
        assert_eq!(finest.last().unwrap().direction_deg, 359.0);

        let odd = sweep(&[], 7.0, T0, 1.0);
        assert_eq!(odd.len(), 52);
        assert_eq!(odd.last().unwrap().direction_deg, 357.0);

        assert!(sweep(&[], 0.0, T0, 1.0).is_empty());
        assert!(sweep(&[], f64::NAN, T0, 1.0).is_empty());
    }

    #[test]
    fn test_soonest_ignores_past_arrivals() {
        let mut late = RainEstimate::insufficient(0.0, 4);
        late.minutes_to_arrival = Some(30.0);
        let mut passed = RainEstimate::insufficient(90.0, 4);
        passed.minutes_to_arrival = Some(-5.0);
        let mut early = RainEstimate::insufficient(180.0, 3);
        early.minutes_to_arrival = Some(12.0);

        let all = vec![late, passed, early];
        assert_eq!(soonest(&all).unwrap().direction_deg, 180.0);
        assert!(soonest(&all[1..2]).is_none());
    }
}
