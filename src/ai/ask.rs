use super::{ChatError, ChatResult, Completion};
use crate::types::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Single-question client for `POST {base}/ask`.
pub struct AskClient {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: Option<String>,
}

impl AskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/ask", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Completion for AskClient {
    async fn complete(&self, question: &str, _history: &[ChatMessage]) -> ChatResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { question })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ChatError::status(status, body));
        }

        parse_answer(&body)
    }
}

fn parse_answer(body: &str) -> ChatResult<String> {
    let parsed: AskResponse = serde_json::from_str(body)?;
    parsed
        .answer
        .ok_or_else(|| ChatError::payload("response has no answer"))
}
