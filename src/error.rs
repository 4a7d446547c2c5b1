use thiserror::Error;

use crate::render::config::ErrorCorrectionLevel;

/// A render configuration that falls outside the supported ranges.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("output size {0}px is outside the supported range {min}..={max}", min = crate::render::config::MIN_OUTPUT_SIZE, max = crate::render::config::MAX_OUTPUT_SIZE)]
    OutputSize(u32),

    #[error("logo size {0}% is outside the supported range {min}..={max}", min = crate::render::config::MIN_LOGO_PERCENT, max = crate::render::config::MAX_LOGO_PERCENT)]
    LogoSize(u32),

    #[error("logo padding {0}px is outside the supported range 0..={max}", max = crate::render::config::MAX_LOGO_PADDING)]
    LogoPadding(u32),

    #[error("invalid {field} color {value:?}")]
    Color { field: &'static str, value: String },
}

/// Failures of the encode and composite pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to encode")]
    EmptyPayload,

    #[error("payload is too long for error correction level {0}")]
    DataTooLong(ErrorCorrectionLevel),

    #[error("could not encode payload: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not decode logo: {0}")]
    Logo(#[source] image::ImageError),

    #[error("could not encode PNG: {0}")]
    Png(#[source] image::ImageError),

    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failures while producing suggestions through the upstream model.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("prompt required")]
    EmptyPrompt,

    #[error("no API key configured for the upstream text-generation service")]
    MissingApiKey,

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream responded with status {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error("upstream output is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("upstream output has the wrong shape: {0}")]
    Shape(String),
}
