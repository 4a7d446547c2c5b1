use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use csscolorparser::Color;
use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const MIN_OUTPUT_SIZE: u32 = 256;
pub const MAX_OUTPUT_SIZE: u32 = 4096;
pub const MIN_LOGO_PERCENT: u32 = 10;
pub const MAX_LOGO_PERCENT: u32 = 40;
pub const MAX_LOGO_PADDING: u32 = 30;

/// How long an explicit logo load may take before it is abandoned.
pub const LOGO_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// QR symbol redundancy tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
pub enum ErrorCorrectionLevel {
    /// Low (7% recovery)
    L,
    /// Medium (15% recovery)
    M,
    /// Quartile (25% recovery)
    Q,
    /// High (30% recovery), recommended when a logo is set
    #[default]
    H,
}

impl ErrorCorrectionLevel {
    pub const ALL: [ErrorCorrectionLevel; 4] = [Self::L, Self::M, Self::Q, Self::H];

    /// Share of the symbol that can be damaged and still be recovered.
    pub fn recovery_percent(self) -> u8 {
        match self {
            Self::L => 7,
            Self::M => 15,
            Self::Q => 25,
            Self::H => 30,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::L => "Low",
            Self::M => "Medium",
            Self::Q => "Quartile",
            Self::H => "High",
        }
    }
}

impl From<ErrorCorrectionLevel> for qrcode::EcLevel {
    fn from(level: ErrorCorrectionLevel) -> Self {
        match level {
            ErrorCorrectionLevel::L => qrcode::EcLevel::L,
            ErrorCorrectionLevel::M => qrcode::EcLevel::M,
            ErrorCorrectionLevel::Q => qrcode::EcLevel::Q,
            ErrorCorrectionLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl fmt::Display for ErrorCorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        };
        f.write_str(letter)
    }
}

/// Raw bytes of a user supplied logo image. Decoding is deferred to the
/// compositor so a broken file only costs the composite step.
#[derive(Clone, PartialEq, Eq)]
pub struct Logo {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for Logo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logo")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Logo {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Logo {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a logo from disk, giving up after `timeout`.
    pub async fn load(path: &Path, timeout: Duration) -> anyhow::Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "logo".to_string());

        Self::read_within(name, tokio::fs::read(path), timeout)
            .await
            .with_context(|| format!("Could not load logo {}", path.display()))
    }

    async fn read_within(
        name: String,
        read: impl Future<Output = io::Result<Vec<u8>>>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let bytes = tokio::time::timeout(timeout, read)
            .await
            .with_context(|| format!("Timed out after {timeout:?}"))??;

        image::guess_format(&bytes).context("Logo is not a recognised image format")?;

        Ok(Logo::new(name, bytes))
    }
}

/// Every user adjustable rendering parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    pub data: String,
    pub fg_color: String,
    pub bg_color: String,
    pub error_correction_level: ErrorCorrectionLevel,
    #[serde(skip)]
    pub logo: Option<Logo>,
    #[serde(alias = "logoPadding")]
    pub logo_padding_px: u32,
    #[serde(alias = "logoSize")]
    pub logo_size_percent: u32,
    #[serde(alias = "qrSize")]
    pub output_size_px: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            data: "https://nepla.com".to_string(),
            fg_color: "#000000".to_string(),
            bg_color: "#ffffff".to_string(),
            error_correction_level: ErrorCorrectionLevel::H,
            logo: None,
            logo_padding_px: 5,
            logo_size_percent: 20,
            output_size_px: 1024,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_OUTPUT_SIZE..=MAX_OUTPUT_SIZE).contains(&self.output_size_px) {
            return Err(ConfigError::OutputSize(self.output_size_px));
        }
        if !(MIN_LOGO_PERCENT..=MAX_LOGO_PERCENT).contains(&self.logo_size_percent) {
            return Err(ConfigError::LogoSize(self.logo_size_percent));
        }
        if self.logo_padding_px > MAX_LOGO_PADDING {
            return Err(ConfigError::LogoPadding(self.logo_padding_px));
        }
        self.colors()?;
        Ok(())
    }

    /// Foreground and background as pixels.
    pub fn colors(&self) -> Result<(Rgba<u8>, Rgba<u8>), ConfigError> {
        Ok((
            parse_color("foreground", &self.fg_color)?,
            parse_color("background", &self.bg_color)?,
        ))
    }
}

fn parse_color(field: &'static str, value: &str) -> Result<Rgba<u8>, ConfigError> {
    let color = Color::from_str(value.trim()).map_err(|_| ConfigError::Color {
        field,
        value: value.to_string(),
    })?;
    Ok(Rgba(color.to_rgba8()))
}
