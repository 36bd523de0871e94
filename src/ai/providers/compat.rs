use super::{PromptMessage, TextStream};
use crate::ai::{ChatError, ChatResult};
use crate::types::Role;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for any OpenAI-compatible chat-completions endpoint.
pub struct CompatClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct CompatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
struct CompatRequest<'a> {
    model: &'a str,
    messages: Vec<CompatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChunkEnvelope {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}

/// One decoded `chat.completion.chunk` event.
#[derive(Debug, PartialEq, Eq)]
pub enum SseEvent {
    Delta(String),
    Error(String),
    Done,
}

/// Parses one SSE `data:` payload. Role-only and empty deltas yield an empty
/// `Delta`; payloads that are not completion chunks yield `None`.
pub fn parse_sse_data(data: &str) -> Option<SseEvent> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "[DONE]" {
        return Some(SseEvent::Done);
    }

    let envelope: ChunkEnvelope = match serde_json::from_str(trimmed) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::debug!(error = %err, "skipping unrecognised SSE payload");
            return None;
        }
    };
    if let Some(error) = envelope.error {
        return Some(SseEvent::Error(error.message));
    }
    let piece = envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();
    Some(SseEvent::Delta(piece))
}

/// Incremental SSE decoder over raw body bytes. Lines are split on `\n`
/// before any UTF-8 decoding, so a character split across network chunks
/// comes out intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_acc: Option<String>,
}

impl SseDecoder {
    /// Feeds one chunk and returns the `data:` payload of every event it
    /// completed. Multi-line data fields are joined with `\n`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            self.apply_line(line.strip_suffix('\r').unwrap_or(&line), &mut events);
        }
        events
    }

    /// Flushes a trailing line and any event the body ended without
    /// terminating.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw);
            let mut events = Vec::new();
            self.apply_line(line.strip_suffix('\r').unwrap_or(&line), &mut events);
            if let Some(data) = events.pop() {
                return Some(data);
            }
        }
        self.data_acc.take()
    }

    fn apply_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            // End of event
            if let Some(data) = self.data_acc.take() {
                events.push(data);
            }
            return;
        }

        if let Some(rest) = line.strip_prefix("data:") {
            let fragment = rest.strip_prefix(' ').unwrap_or(rest);
            match &mut self.data_acc {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(fragment);
                }
                None => self.data_acc = Some(fragment.to_string()),
            }
        }
    }
}

impl CompatClient {
    pub fn new(endpoint: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model,
            api_key,
        }
    }

    pub async fn stream(&self, system: &str, messages: Vec<PromptMessage>) -> ChatResult<TextStream> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(CompatMessage {
            role: Role::System,
            content: system,
        });
        wire.extend(messages.iter().map(|msg| CompatMessage {
            role: msg.role,
            content: &msg.content,
        }));

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("accept", "text/event-stream")
            .json(&CompatRequest {
                model: &self.model,
                messages: wire,
                stream: true,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::status(status, body));
        }

        let mut bytes = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            while let Some(item) = bytes.next().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        yield Err::<String, ChatError>(ChatError::from(err));
                        return;
                    }
                };
                for data in decoder.push(&chunk) {
                    match parse_sse_data(&data) {
                        Some(SseEvent::Delta(piece)) if !piece.is_empty() => yield Ok(piece),
                        Some(SseEvent::Error(message)) => {
                            yield Err(ChatError::Provider(message));
                            return;
                        }
                        Some(SseEvent::Done) => return,
                        _ => {}
                    }
                }
            }
            if let Some(data) = decoder.finish() {
                match parse_sse_data(&data) {
                    Some(SseEvent::Delta(piece)) if !piece.is_empty() => yield Ok(piece),
                    Some(SseEvent::Error(message)) => yield Err(ChatError::Provider(message)),
                    _ => {}
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
