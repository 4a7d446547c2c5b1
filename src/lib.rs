//! Themed QR code rendering with optional logo compositing, plus an AI
//! backed suggestion service for the encoded content.

pub mod error;
pub mod logging;
pub mod render;
pub mod server;
pub mod suggest;
