//! Welcome-screen suggestion cards.

use crate::types::Suggestion;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuggestionError {
    #[error("suggestions request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("suggestions request returned {0}")]
    Status(reqwest::StatusCode),

    #[error("{path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}: file sources need a native target")]
    Unsupported(String),

    #[error("malformed suggestions document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("document has no suggestions list")]
    MissingList,
}

#[derive(Deserialize)]
struct SuggestionDeck {
    #[serde(default)]
    suggestions: Option<Vec<Suggestion>>,
}

/// Loads suggestions from an http(s) URL or a file path. Never fails: any
/// problem is logged and yields an empty list.
pub async fn load_suggestions(source: &str) -> Vec<Suggestion> {
    let loaded = match fetch_source(source).await {
        Ok(body) => parse_suggestions(&body),
        Err(err) => Err(err),
    };
    loaded.unwrap_or_else(|err| {
        tracing::error!(source, error = %err, "Failed to load suggestions");
        Vec::new()
    })
}

async fn fetch_source(source: &str) -> Result<String, SuggestionError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::get(source).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SuggestionError::Status(status));
        }
        Ok(response.text().await?)
    } else {
        #[cfg(not(target_arch = "wasm32"))]
        {
            tokio::fs::read_to_string(source)
                .await
                .map_err(|source_err| SuggestionError::Read {
                    path: source.to_string(),
                    source: source_err,
                })
        }
        #[cfg(target_arch = "wasm32")]
        {
            Err(SuggestionError::Unsupported(source.to_string()))
        }
    }
}

pub fn parse_suggestions(body: &str) -> Result<Vec<Suggestion>, SuggestionError> {
    let deck: SuggestionDeck = serde_json::from_str(body)?;
    deck.suggestions.ok_or(SuggestionError::MissingList)
}
