use std::time::Duration;

use serde::Serialize;

use crate::suggest::SuggestionItem;

pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Serialize)]
struct SuggestRequest<'a> {
    prompt: &'a str,
}

/// Talks to the `/api/ai` endpoint of a running proxy.
#[derive(Debug, Clone)]
pub struct SuggestionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SuggestionClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(SuggestionClient {
            http,
            endpoint: format!("{}/api/ai", base_url.trim_end_matches('/')),
        })
    }

    /// Fetch suggestions for `prompt`. Blank prompts never leave the process,
    /// and every failure degrades to an empty list.
    pub async fn suggest(&self, prompt: &str) -> Vec<SuggestionItem> {
        if prompt.trim().is_empty() {
            tracing::debug!("ignoring blank prompt");
            return Vec::new();
        }

        match self.fetch(prompt).await {
            Ok(items) => items,
            Err(err) => {
                tracing::error!("could not fetch suggestions: {err:#}");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, prompt: &str) -> anyhow::Result<Vec<SuggestionItem>> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&SuggestRequest { prompt })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
