//! Client for the hosted text-generation service (OpenAI Responses API).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SuggestError;
use crate::suggest::{self, SuggestionItem, prompt};

pub const DEFAULT_URL: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: String,
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    // Reasoning and tool items carry no content.
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    OutputText {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ResponsesBody {
    /// Text parts joined per item, items joined by newlines.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .map(|item| {
                item.content
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::OutputText { text } => Some(text.as_str()),
                        ContentPart::Other => None,
                    })
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct Upstream {
    http: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl Upstream {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SuggestError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Upstream {
            http,
            url: url.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// Ask the model for suggestions around `idea`.
    pub async fn suggest(&self, idea: &str) -> Result<Vec<SuggestionItem>, SuggestError> {
        if idea.trim().is_empty() {
            return Err(SuggestError::EmptyPrompt);
        }
        let api_key = self.api_key.as_deref().ok_or(SuggestError::MissingApiKey)?;

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&ResponsesRequest {
                model: &self.model,
                input: prompt::build(idea),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::UpstreamStatus(status));
        }

        let body: ResponsesBody = response.json().await?;
        let text = body.output_text();
        tracing::debug!(model = %self.model, "upstream output: {text}");

        suggest::parse_suggestions(&text)
    }
}
