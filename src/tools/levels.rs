use clap::{Command, CommandFactory, Parser};
use serde_json::json;

use rqr::render::config::ErrorCorrectionLevel;

use crate::tool::{Output, Tool};

#[derive(Parser, Debug)]
#[command(name = "levels", about = "List the QR error correction levels")]
pub struct LevelsTool {}

impl Tool for LevelsTool {
    fn cli() -> Command {
        LevelsTool::command()
    }

    fn execute(&self) -> anyhow::Result<Option<Output>> {
        let levels: Vec<_> = ErrorCorrectionLevel::ALL
            .iter()
            .map(|level| {
                json!({
                    "level": level.to_string(),
                    "name": level.name(),
                    "recovery": format!("{}%", level.recovery_percent()),
                    "recommendedForLogos": *level == ErrorCorrectionLevel::H,
                })
            })
            .collect();

        Ok(Some(Output::JsonValue(json!(levels))))
    }
}
