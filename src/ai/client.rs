use super::{AskClient, ChatResult, ChatStreamClient};
use crate::config::{ChatMode, ClientConfig};
use crate::types::ChatMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// The remote side of a submission: takes a question and returns the answer
/// text. `history` holds the prior user/assistant exchange for collaborators
/// that send the whole conversation.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, question: &str, history: &[ChatMessage]) -> ChatResult<String>;
}

#[async_trait]
impl<T: Completion + ?Sized> Completion for Arc<T> {
    async fn complete(&self, question: &str, history: &[ChatMessage]) -> ChatResult<String> {
        (**self).complete(question, history).await
    }
}

/// Builds the collaborator the configured chat mode asks for.
pub fn completion_from_config(config: &ClientConfig) -> Arc<dyn Completion> {
    match config.mode {
        ChatMode::Ask => Arc::new(AskClient::new(&config.api_url)),
        ChatMode::Stream => Arc::new(ChatStreamClient::new(
            &config.api_url,
            &config.response_style,
        )),
    }
}
