pub mod compat;

use super::{ChatError, ChatResult};
use crate::config::ProviderSettings;
use crate::types::Role;
use async_trait::async_trait;
use futures::Stream;
use rig::client::CompletionClient;
use rig::completion::Chat;
use rig::providers;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

pub use compat::CompatClient;

/// Text deltas from an upstream model, in order.
pub type TextStream = Pin<Box<dyn Stream<Item = ChatResult<String>> + Send>>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Upstream model used by the proxy routes.
///
/// Errors returned from `stream_chat` itself happen before any output was
/// produced; errors inside the stream happen after.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn stream_chat(&self, system: &str, messages: Vec<PromptMessage>)
    -> ChatResult<TextStream>;
}

/// Enum to hold the configured provider client
pub enum ProviderClient {
    Compat(CompatClient),
    OpenAI {
        client: providers::openai::Client,
        model: String,
    },
    Anthropic {
        client: providers::anthropic::Client,
        model: String,
    },
    Ollama {
        client: providers::ollama::Client,
        model: String,
    },
}

impl ProviderClient {
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        match settings {
            ProviderSettings::Compat {
                endpoint,
                model,
                api_key,
            } => Self::Compat(CompatClient::new(
                endpoint.clone(),
                model.clone(),
                api_key.clone(),
            )),
            ProviderSettings::OpenAI { api_key, model } => Self::OpenAI {
                client: providers::openai::Client::new(api_key),
                model: model.clone(),
            },
            ProviderSettings::Anthropic { api_key, model } => Self::Anthropic {
                client: providers::anthropic::Client::new(api_key),
                model: model.clone(),
            },
            ProviderSettings::Ollama { model } => Self::Ollama {
                client: providers::ollama::Client::new(),
                model: model.clone(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Compat(_) => "openai-compatible",
            Self::OpenAI { .. } => "openai",
            Self::Anthropic { .. } => "anthropic",
            Self::Ollama { .. } => "ollama",
        }
    }
}

/// Splits a conversation into the prompt to answer and the history before it.
pub fn split_prompt(
    mut messages: Vec<PromptMessage>,
) -> ChatResult<(String, Vec<rig::message::Message>)> {
    let prompt = match messages.pop() {
        Some(last) if last.role == Role::User => last.content,
        _ => return Err(ChatError::payload("conversation must end with a user message")),
    };

    let history = messages
        .into_iter()
        .filter_map(|msg| match msg.role {
            Role::User => Some(rig::message::Message::user(&msg.content)),
            Role::Assistant => Some(rig::message::Message::assistant(&msg.content)),
            // Style prompts replace client-sent system messages
            Role::System => None,
        })
        .collect();

    Ok((prompt, history))
}

fn single_chunk(text: String) -> TextStream {
    Box::pin(futures::stream::once(async move { Ok(text) }))
}

fn provider_error(err: impl std::fmt::Display) -> ChatError {
    ChatError::Provider(err.to_string())
}

#[async_trait]
impl ModelProvider for ProviderClient {
    async fn stream_chat(
        &self,
        system: &str,
        messages: Vec<PromptMessage>,
    ) -> ChatResult<TextStream> {
        let text = match self {
            Self::Compat(client) => return client.stream(system, messages).await,
            Self::OpenAI { client, model } => {
                let (prompt, history) = split_prompt(messages)?;
                let agent = client
                    .agent(model)
                    .preamble(system)
                    .max_tokens(4096)
                    .temperature(0.7)
                    .build();
                agent
                    .chat(prompt.as_str(), history)
                    .await
                    .map_err(provider_error)?
            }
            Self::Anthropic { client, model } => {
                let (prompt, history) = split_prompt(messages)?;
                let agent = client
                    .agent(model)
                    .preamble(system)
                    .max_tokens(4096)
                    .temperature(0.7)
                    .build();
                agent
                    .chat(prompt.as_str(), history)
                    .await
                    .map_err(provider_error)?
            }
            Self::Ollama { client, model } => {
                let (prompt, history) = split_prompt(messages)?;
                let agent = client.agent(model).preamble(system).build();
                agent
                    .chat(prompt.as_str(), history)
                    .await
                    .map_err(provider_error)?
            }
        };

        Ok(single_chunk(text))
    }
}
