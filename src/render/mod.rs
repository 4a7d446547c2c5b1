//! The QR rendering pipeline: encode the payload, composite an optional logo,
//! and package the result as a PNG.

pub mod compositor;
pub mod config;
pub mod encoder;
pub mod orchestrator;

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{DynamicImage, ImageFormat};

use crate::error::RenderError;
use compositor::LogoLayout;
use config::RenderConfig;

/// File name used for downloaded renders.
pub const DOWNLOAD_FILE_NAME: &str = "qr-code.png";

/// A PNG encoded render of one configuration snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .finish()
    }
}

impl RenderedImage {
    /// Write the image as `qr-code.png` inside `dir`.
    pub fn download(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let path = dir.join(DOWNLOAD_FILE_NAME);
        self.save(&path)?;
        Ok(path)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, &self.png)
            .with_context(|| format!("Could not write {}", path.display()))
    }
}

/// Render `config` into a PNG. Pure: the same config always yields the same
/// bytes.
pub fn render(config: &RenderConfig) -> Result<RenderedImage, RenderError> {
    config.validate()?;
    let (fg, bg) = config.colors()?;
    let size = config.output_size_px;

    let mut canvas = encoder::encode(&config.data, config.error_correction_level, size, fg, bg)?;

    if let Some(logo) = &config.logo {
        let layout = LogoLayout::new(size, config.logo_size_percent, config.logo_padding_px);
        let mut composited = canvas.clone();
        match compositor::composite(&mut composited, &logo.bytes, layout, bg) {
            Ok(()) => canvas = composited,
            Err(err) => {
                tracing::warn!(logo = %logo.name, "skipping logo: {err}");
            }
        }
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(RenderError::Png)?;

    Ok(RenderedImage {
        png,
        width: size,
        height: size,
    })
}
