use std::time::Duration;

use anyhow::Context;
use clap::{Command, CommandFactory, Parser};

use rqr::server::{AppState, router};
use rqr::suggest::upstream::{self, Upstream};

use crate::args::parse_seconds;
use crate::tool::{Output, Tool};

#[derive(Parser, Debug)]
#[command(
    name = "serve",
    about = "Run the suggestion proxy and render API over HTTP"
)]
pub struct ServeTool {
    /// Port number the server should listen to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address the server should bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// API key for the upstream text-generation service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Responses endpoint of the upstream service
    #[arg(long, env = "RQR_UPSTREAM_URL", default_value = upstream::DEFAULT_URL)]
    upstream_url: String,

    /// Model asked for suggestions
    #[arg(long, env = "RQR_MODEL", default_value = upstream::DEFAULT_MODEL)]
    model: String,

    /// Seconds to wait for the upstream service
    #[arg(long, default_value = "60", value_parser = parse_seconds)]
    upstream_timeout: Duration,
}

impl Tool for ServeTool {
    fn cli() -> Command {
        ServeTool::command()
    }

    fn execute(&self) -> anyhow::Result<Option<Output>> {
        rqr::logging::init(tracing::Level::DEBUG);

        tokio::runtime::Runtime::new()
            .context("Could not create tokio runtime")?
            .block_on(self.run())
            .context("Could not run server")?;

        Ok(None)
    }
}

impl ServeTool {
    async fn run(&self) -> anyhow::Result<()> {
        if self.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set, /api/ai requests will fail");
        }

        let upstream = Upstream::new(
            self.upstream_url.clone(),
            self.model.clone(),
            self.api_key.clone(),
            self.upstream_timeout,
        )
        .context("Could not create upstream client")?;

        let listener = tokio::net::TcpListener::bind(format!("{}:{}", self.host, self.port))
            .await
            .context("Could not setup listener")?;

        let app = router(AppState::new(upstream));

        tracing::info!("listening on {}:{}", self.host, self.port);
        axum::serve(listener, app)
            .await
            .context("Could not serve")?;

        Ok(())
    }
}
