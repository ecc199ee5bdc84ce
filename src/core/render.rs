use crate::core::geo::km_circle_radius_px;
use crate::utils::error::Result;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const DEFAULT_RINGS_KM: [f64; 2] = [25.0, 50.0];
const RING_WIDTH_PX: f64 = 1.5;
const CENTER_DOT_PX: f64 = 10.0;
const OVERLAY_ALPHA: f64 = 0.7;
pub const DIRECTION_COLOR: Rgba<u8> = Rgba([255, 128, 0, 255]);
const DIRECTION_WIDTH_PX: f64 = 2.0;

/// Alpha-composites `image` onto an opaque white background.
pub fn composite_over_white(image: &RgbaImage) -> RgbaImage {
    let mut out = RgbaImage::new(image.width(), image.height());
    for (x, y, px) in image.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let alpha = f64::from(a) / 255.0;
        let blend = |c: u8| (f64::from(c) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        out.put_pixel(x, y, Rgba([blend(r), blend(g), blend(b), 255]));
    }
    out
}

fn darken(px: &mut Rgba<u8>, alpha: f64) {
    for c in px.0.iter_mut().take(3) {
        *c = (f64::from(*c) * (1.0 - alpha)).round() as u8;
    }
    px.0[3] = px.0[3].max((alpha * 255.0).round() as u8);
}

/// Draws range rings for each distance in `rings_km` plus a centre dot.
/// Rings are skipped when `tile_km` is unknown (not positive).
pub fn draw_range_rings(image: &mut RgbaImage, tile_km: f64, rings_km: &[f64]) {
    let (width, height) = image.dimensions();
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let radii: Vec<f64> = rings_km
        .iter()
        .map(|&km| km_circle_radius_px(km, tile_km, width, height))
        .filter(|&r| r > 0.0)
        .collect();

    for (x, y, px) in image.enumerate_pixels_mut() {
        let (dx, dy) = (f64::from(x) + 0.5 - cx, f64::from(y) + 0.5 - cy);
        let dist = (dx * dx + dy * dy).sqrt();

        let on_ring = radii
            .iter()
            .any(|&r| (dist - r).abs() <= RING_WIDTH_PX / 2.0);
        let in_dot = dist <= CENTER_DOT_PX / 2.0;

        if on_ring || in_dot {
            darken(px, OVERLAY_ALPHA);
        }
    }
}

/// Marks the analysed ray: from the centre, half the short side long, at
/// `direction_deg` in image coordinates (0° right, 90° down).
pub fn draw_direction_line(image: &mut RgbaImage, direction_deg: f64) {
    let (width, height) = image.dimensions();
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let length = f64::from(width.min(height)) / 2.0;
    let angle = direction_deg.to_radians();
    let (ux, uy) = (angle.cos(), angle.sin());

    for (x, y, px) in image.enumerate_pixels_mut() {
        let (dx, dy) = (f64::from(x) + 0.5 - cx, f64::from(y) + 0.5 - cy);
        let along = dx * ux + dy * uy;
        let across = (dx * uy - dy * ux).abs();
        if (0.0..=length).contains(&along) && across <= DIRECTION_WIDTH_PX / 2.0 {
            *px = DIRECTION_COLOR;
        }
    }
}

/// Display-ready frame: white background, range rings, centre marker and,
/// when given, the direction line drawn on top.
pub fn render_frame(image: &RgbaImage, tile_km: f64, direction_deg: Option<f64>) -> RgbaImage {
    let mut out = composite_over_white(image);
    draw_range_rings(&mut out, tile_km, &DEFAULT_RINGS_KM);
    if let Some(direction) = direction_deg {
        draw_direction_line(&mut out, direction);
    }
    out
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    Ok(image.to_rgba8())
}
