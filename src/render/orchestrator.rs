//! Keeps the published preview in step with the latest configuration.
//!
//! Every configuration change issues a [`RenderJob`] tagged with a sequence
//! number. Jobs may finish in any order; a job only publishes its result if
//! no newer job has been issued since, so the preview never regresses to an
//! older configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::sync::watch;

use crate::error::RenderError;
use crate::render::config::RenderConfig;
use crate::render::{self, RenderedImage};
use crate::suggest::SuggestionItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Rendering,
    Rendered,
    Failed(String),
}

/// What observers of the orchestrator see.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Last successful render. Survives later failures.
    pub image: Option<RenderedImage>,
    pub state: RenderState,
    pub loading: bool,
    /// Sequence number of the most recently issued job.
    pub issued: u64,
    /// Sequence number of the job that produced the current state.
    pub generation: u64,
}

impl Default for Preview {
    fn default() -> Self {
        Preview {
            image: None,
            state: RenderState::Idle,
            loading: false,
            issued: 0,
            generation: 0,
        }
    }
}

/// Outcome of running a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Published,
    Failed,
    /// A newer job was issued while this one ran; its result was dropped.
    Superseded,
}

pub struct Orchestrator {
    config: RenderConfig,
    next_seq: u64,
    preview: watch::Sender<Preview>,
}

impl Orchestrator {
    pub fn new(config: RenderConfig) -> Self {
        let (preview, _) = watch::channel(Preview::default());
        Orchestrator {
            config,
            next_seq: 0,
            preview,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<Preview> {
        self.preview.subscribe()
    }

    pub fn preview(&self) -> Preview {
        self.preview.borrow().clone()
    }

    /// Replace the whole configuration.
    pub fn set_config(&mut self, config: RenderConfig) -> RenderJob {
        self.config = config;
        self.issue()
    }

    /// Change individual fields.
    pub fn update(&mut self, edit: impl FnOnce(&mut RenderConfig)) -> RenderJob {
        edit(&mut self.config);
        self.issue()
    }

    /// Use a suggestion's content as the payload.
    pub fn apply_suggestion(&mut self, item: &SuggestionItem) -> RenderJob {
        tracing::debug!(title = %item.title, "applying suggestion");
        self.update(|config| config.data = item.content.clone())
    }

    /// Re-render the current configuration without changing it.
    pub fn refresh(&mut self) -> RenderJob {
        self.issue()
    }

    /// Write the current image as `qr-code.png` into `dir`.
    pub fn download(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let preview = self.preview.borrow();
        let image = preview.image.as_ref().context("Nothing has been rendered yet")?;
        image.download(dir)
    }

    fn issue(&mut self) -> RenderJob {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.preview.send_modify(|preview| {
            preview.issued = seq;
            preview.loading = true;
            preview.state = RenderState::Rendering;
        });

        RenderJob {
            seq,
            config: self.config.clone(),
            preview: self.preview.clone(),
            settled: false,
        }
    }
}

/// One pending render of a configuration snapshot.
///
/// Dropping a job before it settles, including cancelling `run`, clears the
/// loading flag if it is still the latest job.
#[must_use = "a render job does nothing until it is run"]
pub struct RenderJob {
    seq: u64,
    config: RenderConfig,
    preview: watch::Sender<Preview>,
    settled: bool,
}

impl RenderJob {
    /// Render on the blocking pool and publish the result if still current.
    pub async fn run(mut self) -> Completion {
        let seq = self.seq;
        let config = std::mem::take(&mut self.config);

        let result = tokio::task::spawn_blocking(move || render::render(&config))
            .await
            .map_err(RenderError::from)
            .and_then(|result| result);

        let mut completion = Completion::Superseded;
        self.settled = true;
        self.preview.send_if_modified(|preview| {
            if preview.issued != seq {
                tracing::debug!(seq, latest = preview.issued, "discarding superseded render");
                return false;
            }

            preview.loading = false;
            preview.generation = seq;
            match result {
                Ok(image) => {
                    preview.image = Some(image);
                    preview.state = RenderState::Rendered;
                    completion = Completion::Published;
                }
                Err(err) => {
                    tracing::warn!(seq, "render failed: {err}");
                    preview.state = RenderState::Failed(err.to_string());
                    completion = Completion::Failed;
                }
            }
            true
        });

        completion
    }
}

impl Drop for RenderJob {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let seq = self.seq;
        self.preview.send_if_modified(|preview| {
            if preview.issued != seq || !preview.loading {
                return false;
            }

            tracing::debug!(seq, "render abandoned before publishing");
            preview.loading = false;
            preview.state = match preview.image {
                Some(_) => RenderState::Rendered,
                None => RenderState::Idle,
            };
            true
        });
    }
}
