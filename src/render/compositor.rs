use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::RenderError;

/// Output size at which padding and corner radius are specified as-is.
pub const REFERENCE_SIZE: f64 = 1024.0;

/// Plate corner radius at the reference size.
pub const PLATE_RADIUS: f64 = 8.0;

/// Where the logo and its plate land on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoLayout {
    /// Top left corner of the logo square.
    pub x: u32,
    pub y: u32,
    /// Side length of the logo square.
    pub side: u32,
    /// Plate margin around the logo square.
    pub padding: f64,
    pub radius: f64,
}

impl LogoLayout {
    pub fn new(size: u32, logo_size_percent: u32, logo_padding_px: u32) -> Self {
        let side = (size as f64 * logo_size_percent as f64 / 100.0).round() as u32;
        let offset = (size - side.min(size)) / 2;
        let scale = size as f64 / REFERENCE_SIZE;

        LogoLayout {
            x: offset,
            y: offset,
            side,
            padding: logo_padding_px as f64 * scale,
            radius: PLATE_RADIUS * scale,
        }
    }
}

/// Decode `logo` and lay it over the center of `canvas` on a rounded plate
/// filled with `plate`.
pub fn composite(
    canvas: &mut RgbaImage,
    logo: &[u8],
    layout: LogoLayout,
    plate: Rgba<u8>,
) -> Result<(), RenderError> {
    let logo = image::load_from_memory(logo).map_err(RenderError::Logo)?;
    if layout.side == 0 {
        return Ok(());
    }
    let logo = imageops::resize(
        &logo.to_rgba8(),
        layout.side,
        layout.side,
        FilterType::Lanczos3,
    );

    let x0 = layout.x as f64 - layout.padding;
    let y0 = layout.y as f64 - layout.padding;
    let extent = layout.side as f64 + layout.padding * 2.0;
    fill_rounded_rect(canvas, x0, y0, extent, extent, layout.radius, plate);

    overlay_alpha(canvas, &logo, layout.x, layout.y);
    Ok(())
}

/// Fill every pixel whose center lies inside the rounded rectangle.
fn fill_rounded_rect(
    canvas: &mut RgbaImage,
    x0: f64,
    y0: f64,
    w: f64,
    h: f64,
    r: f64,
    color: Rgba<u8>,
) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    let (x1, y1) = (x0 + w, y0 + h);

    let first_col = x0.floor().max(0.0) as u32;
    let first_row = y0.floor().max(0.0) as u32;
    let last_col = (x1.ceil().max(0.0) as u32).min(canvas.width());
    let last_row = (y1.ceil().max(0.0) as u32).min(canvas.height());

    for py in first_row..last_row {
        for px in first_col..last_col {
            let cx = px as f64 + 0.5;
            let cy = py as f64 + 0.5;
            if cx < x0 || cx > x1 || cy < y0 || cy > y1 {
                continue;
            }

            // Distance past the nearest corner center, zero along the straight edges.
            let dx = (x0 + r - cx).max(cx - (x1 - r)).max(0.0);
            let dy = (y0 + r - cy).max(cy - (y1 - r)).max(0.0);
            if dx * dx + dy * dy <= r * r {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

/// Source-over blend of `over` onto `base` at (`x`, `y`).
fn overlay_alpha(base: &mut RgbaImage, over: &RgbaImage, x: u32, y: u32) {
    for (ox, oy, pixel) in over.enumerate_pixels() {
        let a = pixel.0[3] as f32 / 255.0;
        if a <= 0.0 {
            continue;
        }
        let (bx, by) = (x + ox, y + oy);
        if bx >= base.width() || by >= base.height() {
            continue;
        }

        let dst = base.get_pixel_mut(bx, by);
        let inv = 1.0 - a;
        for channel in 0..3 {
            dst.0[channel] = (pixel.0[channel] as f32 * a + dst.0[channel] as f32 * inv).round() as u8;
        }
        dst.0[3] = (pixel.0[3] as f32 + dst.0[3] as f32 * inv).round().min(255.0) as u8;
    }
}
