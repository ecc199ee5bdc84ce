use image::RgbaImage;

/// Values at or above this are counted as rain when clustering a cross-section.
pub const RAIN_THRESHOLD: f64 = 0.3;
/// Threshold applied to the simplified 0/1 mask.
pub const MASK_THRESHOLD: f64 = 0.5;

/// Normalised rain intensity per pixel, row-major, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityGrid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl IntensityGrid {
    /// Mean of the colour channels weighted by alpha, scaled so the strongest
    /// pixel is 1.0. A grid without any signal stays all zero.
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut values: Vec<f64> = image
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                let mean = (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0;
                mean * (f64::from(a) / 255.0)
            })
            .collect();

        let max = values.iter().copied().fold(0.0_f64, f64::max);
        if max > 0.0 {
            for v in &mut values {
                *v /= max;
            }
        }

        Self {
            width: width as usize,
            height: height as usize,
            values,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }
}

/// Pixels sampled along a ray from the image centre, ordered by distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossSection {
    /// `(y, x)` pixel coordinates.
    pub coords: Vec<(usize, usize)>,
    pub values: Vec<f64>,
    pub distances: Vec<f64>,
}

impl CrossSection {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Samples the grid along a ray at `angle_deg` (image coordinates, 0° points
/// right, 90° points down) using nearest-pixel lookup.
pub fn cross_section(grid: &IntensityGrid, angle_deg: f64) -> CrossSection {
    let (width, height) = (grid.width as f64, grid.height as f64);
    let (cy, cx) = (height / 2.0, width / 2.0);

    let angle = angle_deg.to_radians();
    let (dx, dy) = (angle.cos(), angle.sin());

    let max_dist = ((height * height + width * width).sqrt() / 2.0).ceil() as usize;

    let mut coords = Vec::new();
    for n in 0..max_dist {
        let x = (cx + n as f64 * dx).round_ties_even();
        let y = (cy + n as f64 * dy).round_ties_even();
        if x < 0.0 || y < 0.0 || x >= width || y >= height {
            break;
        }
        coords.push((y as usize, x as usize));
    }

    let distance = |(y, x): (usize, usize)| -> f64 {
        let (dy, dx) = (y as f64 - cy, x as f64 - cx);
        (dy * dy + dx * dx).sqrt()
    };

    coords.sort_by(|a, b| distance(*a).total_cmp(&distance(*b)));

    let values = coords.iter().map(|&(y, x)| grid.get(x, y)).collect();
    let distances = coords.iter().map(|&pt| distance(pt)).collect();

    CrossSection {
        coords,
        values,
        distances,
    }
}

/// Splits the indices whose value is `>= threshold` into runs of consecutive
/// indices.
pub fn cluster_rain_regions(values: &[f64], threshold: f64) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if v < threshold {
            continue;
        }
        match clusters.last_mut() {
            Some(run) if run.last() == Some(&(i - 1)) => run.push(i),
            _ => clusters.push(vec![i]),
        }
    }
    clusters
}

/// Reduces a cross-section to a 0/1 rain mask.
///
/// Gaps narrower than `min_cluster_size` are bridged into the following
/// cluster, small interior clusters are dropped as noise, and the first and
/// last clusters are always kept.
pub fn simplify_rain_regions(values: &[f64], min_cluster_size: f64, threshold: f64) -> Vec<f64> {
    let mut clusters = cluster_rain_regions(values, threshold);
    let mut mask = vec![0.0; values.len()];

    if clusters.len() <= 1 {
        for cluster in &clusters {
            mark(cluster, &mut mask);
        }
        return mask;
    }

    for i in 0..clusters.len() - 1 {
        let (left_min, left_max) = (clusters[i][0], clusters[i][clusters[i].len() - 1]);
        let right = &clusters[i + 1];
        let (right_min, right_max) = (right[0], right[right.len() - 1]);
        if ((right_min - left_max) as f64) < min_cluster_size {
            clusters[i + 1] = (left_min..=right_max).collect();
        }
    }

    let last = clusters.len() - 1;
    for cluster in &clusters[1..last] {
        if cluster.len() as f64 >= min_cluster_size {
            mark(cluster, &mut mask);
        }
    }
    mark(&clusters[0], &mut mask);
    mark(&clusters[last], &mut mask);

    mask
}

fn mark(cluster: &[usize], mask: &mut [f64]) {
    for &i in cluster {
        mask[i] = 1.0;
    }
}

pub fn find_first_above_threshold(values: &[f64], threshold: f64) -> Option<usize> {
    values.iter().position(|&v| v > threshold)
}

/// Fraction of grid cells at or above `threshold`.
pub fn rain_coverage(grid: &IntensityGrid, threshold: f64) -> f64 {
    if grid.values.is_empty() {
        return 0.0;
    }
    let wet = grid.values.iter().filter(|&&v| v >= threshold).count();
    wet as f64 / grid.values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn grid_from(width: usize, height: usize, values: Vec<f64>) -> IntensityGrid {
        IntensityGrid {
            width,
            height,
            values,
        }
    }

    #[test]
    fn test_intensity_grid_weights_alpha_and_normalizes() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([90, 90, 90, 255]));
        image.put_pixel(1, 0, Rgba([90, 90, 90, 51]));

        let grid = IntensityGrid::from_rgba(&image);
        assert_eq!(grid.width, 2);
        assert_eq!(grid.height, 1);
        assert!((grid.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((grid.get(1, 0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_intensity_grid_all_transparent_stays_zero() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([200, 10, 10, 0]));
        let grid = IntensityGrid::from_rgba(&image);
        assert!(grid.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_cross_section_east_walks_to_edge() {
        let grid = grid_from(8, 8, (0..64).map(|i| (i % 8) as f64).collect());
        let section = cross_section(&grid, 0.0);

        // centre is (4, 4); moving right reaches x = 7 before leaving the image
        assert_eq!(section.coords, vec![(4, 4), (4, 5), (4, 6), (4, 7)]);
        assert_eq!(section.values, vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(section.distances, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cross_section_south_uses_rows() {
        let grid = grid_from(6, 6, (0..36).map(|i| (i / 6) as f64).collect());
        let section = cross_section(&grid, 90.0);
        assert_eq!(section.coords.first(), Some(&(3, 3)));
        assert_eq!(section.coords.last(), Some(&(5, 3)));
        assert_eq!(section.values, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_cross_section_odd_size_rounds_half_to_even() {
        // centre (2.5, 2.5): 2.5 → 2, 3.5 → 4, 4.5 → 4
        let grid = grid_from(5, 5, (0..25).map(f64::from).collect());

        let east = cross_section(&grid, 0.0);
        assert_eq!(east.coords, vec![(2, 2), (2, 4), (2, 4)]);
        assert_eq!(east.values, vec![12.0, 14.0, 14.0]);

        let north_west = cross_section(&grid, 225.0);
        assert_eq!(north_west.coords, vec![(2, 2), (2, 2), (1, 1), (0, 0)]);
        assert!(north_west.distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_cross_section_distances_are_sorted() {
        let grid = grid_from(32, 20, vec![0.0; 640]);
        for angle in [0.0, 33.0, 135.0, 200.0, 315.0] {
            let section = cross_section(&grid, angle);
            assert!(!section.is_empty());
            assert!(section.distances.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_cluster_rain_regions() {
        let values = [0.0, 0.5, 0.4, 0.1, 0.3, 0.0, 0.9, 0.9, 0.9];
        let clusters = cluster_rain_regions(&values, RAIN_THRESHOLD);
        assert_eq!(clusters, vec![vec![1, 2], vec![4], vec![6, 7, 8]]);
    }

    #[test]
    fn test_cluster_rain_regions_without_rain() {
        assert!(cluster_rain_regions(&[0.0, 0.1, 0.29], RAIN_THRESHOLD).is_empty());
        assert!(cluster_rain_regions(&[], RAIN_THRESHOLD).is_empty());
    }

    #[test]
    fn test_simplify_single_cluster_is_kept() {
        let values = [0.0, 0.0, 0.8, 0.8, 0.0];
        assert_eq!(
            simplify_rain_regions(&values, 10.0, RAIN_THRESHOLD),
            vec![0.0, 0.0, 1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_simplify_bridges_narrow_gaps() {
        // clusters [1], [3], [9, 10]; gap 1→3 is 2 (< 3) so [3] grows to [1..=3]
        let mut values = vec![0.0; 12];
        for i in [1, 3, 9, 10] {
            values[i] = 1.0;
        }
        let mask = simplify_rain_regions(&values, 3.0, RAIN_THRESHOLD);
        assert_eq!(
            mask,
            vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_simplify_drops_small_interior_clusters() {
        // [0..=1], [5], [10..=11]: interior [5] is smaller than 2 and the gaps are wide
        let mut values = vec![0.0; 12];
        for i in [0, 1, 5, 10, 11] {
            values[i] = 1.0;
        }
        let mask = simplify_rain_regions(&values, 2.0, RAIN_THRESHOLD);
        assert_eq!(mask[5], 0.0);
        assert_eq!(&mask[0..2], &[1.0, 1.0]);
        assert_eq!(&mask[10..12], &[1.0, 1.0]);
    }

    #[test]
    fn test_find_first_above_threshold() {
        assert_eq!(find_first_above_threshold(&[0.0, 0.5, 1.0], MASK_THRESHOLD), Some(2));
        assert_eq!(find_first_above_threshold(&[0.0, 0.5], MASK_THRESHOLD), None);
    }

    #[test]
    fn test_rain_coverage() {
        let grid = grid_from(2, 2, vec![0.0, 0.3, 0.9, 0.1]);
        assert!((rain_coverage(&grid, RAIN_THRESHOLD) - 0.5).abs() < 1e-12);
        assert_eq!(rain_coverage(&grid_from(0, 0, vec![]), RAIN_THRESHOLD), 0.0);
    }
}
