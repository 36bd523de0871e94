use super::{ChatError, ChatResult, Completion};
use crate::data_stream::{DATA_STREAM_HEADER, StreamPart, parse_stream_part};
use crate::types::{ChatMessage, Role};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;

/// Conversation client for `POST {base}/api/chat`; collects the streamed
/// reply into one answer.
pub struct ChatStreamClient {
    client: Client,
    endpoint: String,
    response_style: String,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestData<'a> {
    response_style: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<WireMessage<'a>>,
    data: RequestData<'a>,
}

impl ChatStreamClient {
    pub fn new(base_url: &str, response_style: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            response_style: response_style.to_string(),
        }
    }

    fn build_request<'a>(&'a self, question: &'a str, history: &'a [ChatMessage]) -> ChatRequest<'a> {
        let mut messages: Vec<WireMessage<'a>> = history
            .iter()
            .filter(|msg| matches!(msg.role, Role::User | Role::Assistant))
            .map(|msg| WireMessage {
                role: msg.role,
                content: &msg.content,
            })
            .collect();
        messages.push(WireMessage {
            role: Role::User,
            content: question,
        });
        ChatRequest {
            messages,
            data: RequestData {
                response_style: &self.response_style,
            },
        }
    }
}

#[async_trait]
impl Completion for ChatStreamClient {
    async fn complete(&self, question: &str, history: &[ChatMessage]) -> ChatResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.build_request(question, history))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::status(status, body));
        }

        let framed = response.headers().contains_key(DATA_STREAM_HEADER);
        let mut collector = StreamCollector::new(framed);
        let mut stream = response.bytes_stream();
        // Chunks may split a multi-byte character; hold the tail back.
        let mut pending: Vec<u8> = Vec::new();
        while let Some(item) = stream.next().await {
            pending.extend_from_slice(&item?);
            let complete = match std::str::from_utf8(&pending) {
                Ok(_) => pending.len(),
                Err(err) if err.error_len().is_none() => err.valid_up_to(),
                Err(_) => pending.len(),
            };
            let text = String::from_utf8_lossy(&pending[..complete]).into_owned();
            pending.drain(..complete);
            if collector.push(&text)? {
                break;
            }
        }
        if !pending.is_empty() {
            collector.push(&String::from_utf8_lossy(&pending))?;
        }
        collector.finish()
    }
}

/// Accumulates a response body. Framed bodies are split into protocol lines;
/// anything else is taken as plain text.
#[derive(Debug)]
pub struct StreamCollector {
    framed: bool,
    buffer: String,
    answer: String,
    finished: bool,
}

impl StreamCollector {
    pub fn new(framed: bool) -> Self {
        Self {
            framed,
            buffer: String::new(),
            answer: String::new(),
            finished: false,
        }
    }

    /// Feeds one chunk. Returns `Ok(true)` once a finish part has been seen.
    pub fn push(&mut self, chunk: &str) -> ChatResult<bool> {
        if !self.framed {
            self.answer.push_str(chunk);
            return Ok(false);
        }

        self.buffer.push_str(chunk);
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if self.apply(&line)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn apply(&mut self, line: &str) -> ChatResult<bool> {
        match parse_stream_part(line) {
            Some(StreamPart::Text(piece)) => self.answer.push_str(&piece),
            Some(StreamPart::Error(message)) => return Err(ChatError::Stream(message)),
            Some(StreamPart::Finish) => {
                self.finished = true;
                return Ok(true);
            }
            Some(StreamPart::Other) | None => {}
        }
        Ok(false)
    }

    pub fn finish(mut self) -> ChatResult<String> {
        if self.framed && !self.finished && !self.buffer.trim().is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.apply(&rest)?;
        }
        if self.answer.trim().is_empty() {
            return Err(ChatError::payload("empty response"));
        }
        Ok(self.answer)
    }
}
