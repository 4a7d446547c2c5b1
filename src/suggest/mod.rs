//! AI assisted content suggestions.

pub mod client;
pub mod prompt;
pub mod upstream;

use serde::{Deserialize, Serialize};

use crate::error::SuggestError;

/// Number of suggestions the upstream model must return per prompt.
pub const SUGGESTION_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionItem {
    pub title: String,
    /// Value placed into the payload when the suggestion is picked.
    pub content: String,
    pub description: String,
}

/// Parse the model's text output into exactly [`SUGGESTION_COUNT`] complete
/// suggestions.
pub fn parse_suggestions(output: &str) -> Result<Vec<SuggestionItem>, SuggestError> {
    let items: Vec<SuggestionItem> =
        serde_json::from_str(strip_code_fence(output)).map_err(SuggestError::InvalidJson)?;

    if items.len() != SUGGESTION_COUNT {
        return Err(SuggestError::Shape(format!(
            "expected {SUGGESTION_COUNT} suggestions, got {}",
            items.len()
        )));
    }

    for (index, item) in items.iter().enumerate() {
        for (field, value) in [
            ("title", &item.title),
            ("content", &item.content),
            ("description", &item.description),
        ] {
            if value.trim().is_empty() {
                return Err(SuggestError::Shape(format!(
                    "suggestion {} has an empty {field}",
                    index + 1
                )));
            }
        }
    }

    Ok(items)
}

// Models like to wrap JSON in a markdown fence even when told not to.
fn strip_code_fence(output: &str) -> &str {
    let trimmed = output.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}
