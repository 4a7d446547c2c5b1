use image::{Rgba, RgbaImage};
use qrcode::types::QrError;
use qrcode::{Color, QrCode};

use crate::error::RenderError;
use crate::render::config::ErrorCorrectionLevel;

/// Blank modules kept around the symbol on every side.
pub const QUIET_MARGIN: usize = 2;

/// Build the module matrix for `data`.
pub fn symbol(data: &str, level: ErrorCorrectionLevel) -> Result<QrCode, RenderError> {
    if data.is_empty() {
        return Err(RenderError::EmptyPayload);
    }

    QrCode::with_error_correction_level(data.as_bytes(), level.into()).map_err(|err| match err {
        QrError::DataTooLong => RenderError::DataTooLong(level),
        other => RenderError::Encode(other),
    })
}

/// Encode `data` into a `size` x `size` raster.
pub fn encode(
    data: &str,
    level: ErrorCorrectionLevel,
    size: u32,
    fg: Rgba<u8>,
    bg: Rgba<u8>,
) -> Result<RgbaImage, RenderError> {
    let code = symbol(data, level)?;
    Ok(rasterize(&code, size, fg, bg))
}

/// Stretch the module grid, margin included, over exactly `size` pixels.
/// Each pixel takes the color of the module its position falls into, so
/// modules differ by at most one pixel in width.
pub fn rasterize(code: &QrCode, size: u32, fg: Rgba<u8>, bg: Rgba<u8>) -> RgbaImage {
    let width = code.width();
    let total = (width + QUIET_MARGIN * 2) as u64;
    let colors = code.to_colors();

    // Module column for every pixel column; the same table serves rows.
    let lookup: Vec<Option<usize>> = (0..size as u64)
        .map(|px| {
            let module = (px * total / size as u64) as usize;
            module
                .checked_sub(QUIET_MARGIN)
                .filter(|module| *module < width)
        })
        .collect();

    RgbaImage::from_fn(size, size, |x, y| {
        match (lookup[x as usize], lookup[y as usize]) {
            (Some(mx), Some(my)) if colors[my * width + mx] == Color::Dark => fg,
            _ => bg,
        }
    })
}
