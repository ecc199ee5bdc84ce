/// Earth's equatorial circumference in kilometres.
pub const EARTH_CIRCUMFERENCE_KM: f64 = 40075.0;

/// Approximate ground width (and height) of one web-map tile at `zoom`,
/// corrected for `latitude` in degrees.
pub fn tile_size_km(zoom: u8, latitude: f64) -> f64 {
    let n_tiles = 2f64.powi(i32::from(zoom));
    EARTH_CIRCUMFERENCE_KM / n_tiles * latitude.to_radians().cos()
}

/// Ground distance covered by one pixel of a `size`-pixel radar image.
pub fn km_per_pixel(zoom: u8, latitude: f64, size: u32) -> f64 {
    if size == 0 {
        return 0.0;
    }
    tile_size_km(zoom, latitude) / f64::from(size)
}

/// Pixel radius of a `radius_km` circle on an image of `width`×`height`
/// that spans one tile of `tile_km`.
pub fn km_circle_radius_px(radius_km: f64, tile_km: f64, width: u32, height: u32) -> f64 {
    if tile_km <= 0.0 {
        return 0.0;
    }
    radius_km / tile_km * f64::from(width.min(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_tile_size_at_equator() {
        assert!(approx(tile_size_km(0, 0.0), 40075.0, 1e-9));
        assert!(approx(tile_size_km(7, 0.0), 40075.0 / 128.0, 1e-9));
    }

    #[test]
    fn test_tile_size_shrinks_with_latitude() {
        let krakow = tile_size_km(7, 50.061);
        assert!(approx(krakow, 40075.0 / 128.0 * 50.061f64.to_radians().cos(), 1e-9));
        assert!(krakow < tile_size_km(7, 0.0));
        assert!(approx(tile_size_km(7, 60.0), tile_size_km(7, 0.0) / 2.0, 1e-9));
    }

    #[test]
    fn test_km_per_pixel() {
        assert!(approx(km_per_pixel(7, 0.0, 512), 40075.0 / 128.0 / 512.0, 1e-12));
        assert_eq!(km_per_pixel(7, 0.0, 0), 0.0);
    }

    #[test]
    fn test_km_circle_radius() {
        // 25 km on a 100 km tile rendered at 400x512 → a quarter of the short side
        assert!(approx(km_circle_radius_px(25.0, 100.0, 400, 512), 100.0, 1e-9));
        assert_eq!(km_circle_radius_px(25.0, 0.0, 400, 400), 0.0);
    }
}
