use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Command, CommandFactory, Parser};
use serde_json::json;

use rqr::render::orchestrator::{Completion, Orchestrator, RenderState};
use rqr::suggest::client::{DEFAULT_PROXY_URL, SuggestionClient};

use crate::args::{StringInput, parse_seconds};
use crate::tool::{Output, Tool};
use crate::tools::render::{Delivery, RenderArgs};

#[derive(Parser, Debug)]
#[command(
    name = "suggest",
    about = "Ask the suggestion proxy for QR content ideas, optionally rendering one"
)]
pub struct SuggestTool {
    /// Free-text idea, e.g. "WiFi for guest room" (use "-" for stdin)
    prompt: StringInput,

    /// Base URL of a running `rqr serve`
    #[arg(long, env = "RQR_PROXY_URL", default_value = DEFAULT_PROXY_URL)]
    proxy_url: String,

    /// Seconds to wait for the proxy
    #[arg(long, default_value = "60", value_parser = parse_seconds)]
    timeout: Duration,

    /// Render the Nth suggestion (1-based) instead of listing them
    #[arg(long)]
    pick: Option<usize>,

    #[command(flatten)]
    render: RenderArgs,
}

impl Tool for SuggestTool {
    fn cli() -> Command {
        SuggestTool::command()
    }

    fn execute(&self) -> Result<Option<Output>> {
        rqr::logging::init(tracing::Level::WARN);

        tokio::runtime::Runtime::new()
            .context("Could not create tokio runtime")?
            .block_on(self.run())
    }
}

impl SuggestTool {
    async fn run(&self) -> Result<Option<Output>> {
        let client = SuggestionClient::new(&self.proxy_url, self.timeout)?;
        let suggestions = client.suggest(self.prompt.as_ref()).await;

        let Some(pick) = self.pick else {
            return Ok(Some(Output::JsonValue(serde_json::to_value(&suggestions)?)));
        };

        if suggestions.is_empty() {
            bail!("No suggestions available");
        }
        let Some(item) = pick.checked_sub(1).and_then(|index| suggestions.get(index)) else {
            bail!("Pick must be between 1 and {}", suggestions.len());
        };

        // Start from the configured look, then let the suggestion drive a re-render.
        let mut orchestrator = Orchestrator::new(self.render.config(None).await?);
        let completion = orchestrator.apply_suggestion(item).run().await;
        if completion != Completion::Published {
            if let RenderState::Failed(reason) = &orchestrator.preview().state {
                bail!("Could not render suggestion: {reason}");
            }
            bail!("Render did not complete");
        }

        let path = match self.render.deliver(&orchestrator)? {
            Delivery::Stdout(bytes) => return Ok(Some(Output::Bytes(bytes))),
            Delivery::File(path) => path,
        };

        Ok(Some(Output::JsonValue(json!({
            "picked": item,
            "output": path.display().to_string(),
        }))))
    }
}
