use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Command, CommandFactory, Parser};
use rqr::render::DOWNLOAD_FILE_NAME;
use rqr::render::config::{
    ErrorCorrectionLevel, LOGO_LOAD_TIMEOUT, Logo, MAX_LOGO_PADDING, MAX_LOGO_PERCENT,
    MAX_OUTPUT_SIZE, MIN_LOGO_PERCENT, MIN_OUTPUT_SIZE, RenderConfig,
};
use rqr::render::orchestrator::{Completion, Orchestrator, RenderState};

use crate::args::StringInput;
use crate::tool::{Output, Tool};

/// Where a finished render ended up.
pub enum Delivery {
    Stdout(Vec<u8>),
    File(PathBuf),
}

/// Styling and output options shared by every command that renders.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Load a RenderConfig JSON file; other flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Color of the dark modules
    #[arg(long)]
    fg: Option<String>,

    /// Background color, also used for the logo plate
    #[arg(long)]
    bg: Option<String>,

    /// Error correction level
    #[arg(short = 'e', long, value_enum, ignore_case = true)]
    level: Option<ErrorCorrectionLevel>,

    /// Width and height of the output image in pixels
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(MIN_OUTPUT_SIZE as i64..=MAX_OUTPUT_SIZE as i64))]
    size: Option<u32>,

    /// Image to place in the center of the code
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Logo side as a percentage of the output width
    #[arg(long, value_parser = clap::value_parser!(u32).range(MIN_LOGO_PERCENT as i64..=MAX_LOGO_PERCENT as i64))]
    logo_size: Option<u32>,

    /// Plate padding around the logo, in pixels at 1024px output
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_LOGO_PADDING as i64))]
    logo_padding: Option<u32>,

    /// Where to write the PNG ("-" for stdout)
    #[arg(short, long, default_value = DOWNLOAD_FILE_NAME)]
    output: PathBuf,
}

impl RenderArgs {
    /// Assemble the configuration: file first, then flag overrides.
    pub async fn config(&self, data: Option<&str>) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Could not read {}", path.display()))?;
                serde_json::from_str(&text).context("Could not parse render config")?
            }
            None => RenderConfig::default(),
        };

        if let Some(data) = data {
            config.data = data.to_string();
        }
        if let Some(fg) = &self.fg {
            config.fg_color = fg.clone();
        }
        if let Some(bg) = &self.bg {
            config.bg_color = bg.clone();
        }
        if let Some(level) = self.level {
            config.error_correction_level = level;
        }
        if let Some(size) = self.size {
            config.output_size_px = size;
        }
        if let Some(percent) = self.logo_size {
            config.logo_size_percent = percent;
        }
        if let Some(padding) = self.logo_padding {
            config.logo_padding_px = padding;
        }
        if let Some(path) = &self.logo {
            config.logo = Some(Logo::load(path, LOGO_LOAD_TIMEOUT).await?);
        }

        config.validate().context("Invalid render configuration")?;
        Ok(config)
    }

    /// Send the current image to stdout, into a directory as `qr-code.png`,
    /// or to the given file.
    pub fn deliver(&self, orchestrator: &Orchestrator) -> Result<Delivery> {
        if self.output.as_os_str() == "-" {
            let image = orchestrator
                .preview()
                .image
                .context("Nothing has been rendered")?;
            return Ok(Delivery::Stdout(image.png));
        }

        let path = if self.output.is_dir() {
            orchestrator.download(&self.output)?
        } else {
            let preview = orchestrator.preview();
            let image = preview.image.as_ref().context("Nothing has been rendered")?;
            image.save(&self.output)?;
            self.output.clone()
        };

        tracing::info!(path = %path.display(), "saved QR code");
        Ok(Delivery::File(path))
    }
}

#[derive(Parser, Debug)]
#[command(name = "render", about = "Render a QR code to PNG")]
pub struct RenderTool {
    /// Text or URL to encode (use "-" for stdin)
    data: Option<StringInput>,

    #[command(flatten)]
    options: RenderArgs,
}

impl Tool for RenderTool {
    fn cli() -> Command {
        RenderTool::command()
    }

    fn execute(&self) -> Result<Option<Output>> {
        rqr::logging::init(tracing::Level::WARN);

        tokio::runtime::Runtime::new()
            .context("Could not create tokio runtime")?
            .block_on(self.run())
    }
}

impl RenderTool {
    async fn run(&self) -> Result<Option<Output>> {
        let data = self.data.as_ref().map(|data| data.as_ref());
        let config = self.options.config(data).await?;

        let mut orchestrator = Orchestrator::new(config);
        match orchestrator.refresh().run().await {
            Completion::Published => {}
            _ => match orchestrator.preview().state {
                RenderState::Failed(reason) => bail!("Could not render QR code: {reason}"),
                _ => bail!("Render did not complete"),
            },
        }

        match self.options.deliver(&orchestrator)? {
            Delivery::Stdout(bytes) => Ok(Some(Output::Bytes(bytes))),
            Delivery::File(path) => Ok(Some(Output::JsonValue(serde_json::json!({
                "output": path.display().to_string(),
            })))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(args: &[&str]) -> RenderTool {
        RenderTool::try_parse_from(std::iter::once("render").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let tool = tool(&[
            "https://example.com",
            "--size",
            "512",
            "-e",
            "q",
            "--fg",
            "#336699",
            "-o",
            path.to_str().unwrap(),
        ]);

        let Output::JsonValue(value) = tool.execute().unwrap().unwrap() else {
            unreachable!()
        };
        assert_eq!(value["output"], path.display().to_string());
        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (512, 512));
    }

    #[test]
    fn test_render_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let tool = tool(&["hello", "--size", "256", "-o", dir.path().to_str().unwrap()]);
        tool.execute().unwrap();
        assert!(dir.path().join("qr-code.png").is_file());
    }

    #[test]
    fn test_render_to_stdout() {
        let tool = tool(&["hello", "--size", "256", "-o", "-"]);
        let Output::Bytes(bytes) = tool.execute().unwrap().unwrap() else {
            unreachable!()
        };
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image.width(), 256);
    }

    #[test]
    fn test_rejects_out_of_range_flags() {
        assert!(RenderTool::try_parse_from(["render", "x", "--size", "128"]).is_err());
        assert!(RenderTool::try_parse_from(["render", "x", "--logo-size", "50"]).is_err());
        assert!(RenderTool::try_parse_from(["render", "x", "--logo-padding", "31"]).is_err());
    }

    #[test]
    fn test_payload_too_long_fails() {
        let data = "y".repeat(1500);
        let tool = tool(&[data.as_str(), "-e", "H", "-o", "-"]);
        let err = tool.execute().unwrap_err();
        assert!(format!("{err:#}").contains("too long"));
    }

    #[tokio::test]
    async fn test_config_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r##"{"data": "from file", "bgColor": "#eeeeee", "qrSize": 2048, "errorCorrectionLevel": "M"}"##,
        )
        .unwrap();

        let tool = tool(&["--config", path.to_str().unwrap(), "--size", "300"]);
        let config = tool.options.config(None).await.unwrap();
        assert_eq!(config.data, "from file");
        assert_eq!(config.bg_color, "#eeeeee");
        assert_eq!(config.output_size_px, 300);
        assert_eq!(config.error_correction_level, ErrorCorrectionLevel::M);
    }

    #[tokio::test]
    async fn test_invalid_color_is_rejected() {
        let tool = tool(&["data", "--bg", "not-a-color"]);
        assert!(tool.options.config(None).await.is_err());
    }
}
