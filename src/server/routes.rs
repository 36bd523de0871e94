use super::AppState;
use super::error::{Result, ServerError};
use crate::ai::providers::{ModelProvider, PromptMessage, TextStream};
use crate::data_stream::{
    DATA_STREAM_HEADER, DATA_STREAM_VERSION, error_part, finish_part, text_part,
};
use crate::prompts::ResponseStyle;
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatData {
    #[serde(default)]
    pub response_style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<PromptMessage>,
    #[serde(default)]
    pub data: Option<ChatData>,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "status": "Backend running" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Opens the upstream stream, bounded by the request deadline.
async fn open_stream<P>(
    state: &AppState<P>,
    deadline: Instant,
    style: ResponseStyle,
    messages: Vec<PromptMessage>,
) -> Result<TextStream>
where
    P: ModelProvider + ?Sized,
{
    match timeout_at(
        deadline,
        state.provider.stream_chat(style.system_prompt(), messages),
    )
    .await
    {
        Ok(opened) => Ok(opened?),
        Err(_) => Err(ServerError::Timeout(state.max_duration)),
    }
}

pub async fn ask<P>(
    State(state): State<AppState<P>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>>
where
    P: ModelProvider + ?Sized + 'static,
{
    let deadline = Instant::now() + state.max_duration;
    let style = ResponseStyle::resolve(None);
    tracing::debug!(style = style.key(), "ask request");

    let mut upstream = open_stream(
        &state,
        deadline,
        style,
        vec![PromptMessage::user(request.question)],
    )
    .await?;

    let mut answer = String::new();
    loop {
        match timeout_at(deadline, upstream.next()).await {
            Ok(Some(chunk)) => answer.push_str(&chunk?),
            Ok(None) => break,
            Err(_) => return Err(ServerError::Timeout(state.max_duration)),
        }
    }

    Ok(Json(AskResponse { answer }))
}

pub async fn chat<P>(
    State(state): State<AppState<P>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response>
where
    P: ModelProvider + ?Sized + 'static,
{
    let deadline = Instant::now() + state.max_duration;
    let requested = request.data.and_then(|data| data.response_style);
    let style = ResponseStyle::resolve(requested.as_deref());
    tracing::debug!(
        style = style.key(),
        messages = request.messages.len(),
        "chat request"
    );

    let upstream = open_stream(&state, deadline, style, request.messages).await?;
    let body = Body::from_stream(encode_parts(upstream, deadline, state.max_duration));

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                axum::http::HeaderName::from_static(DATA_STREAM_HEADER),
                DATA_STREAM_VERSION,
            ),
        ],
        body,
    )
        .into_response())
}

/// Re-frames upstream text as data-stream parts. Errors after the first
/// byte can no longer change the status, so they become an error part.
fn encode_parts(
    mut upstream: TextStream,
    deadline: Instant,
    limit: Duration,
) -> impl Stream<Item = std::result::Result<String, Infallible>> + Send + 'static {
    async_stream::stream! {
        loop {
            match timeout_at(deadline, upstream.next()).await {
                Ok(Some(Ok(text))) => {
                    if !text.is_empty() {
                        yield Ok::<String, Infallible>(text_part(&text));
                    }
                }
                Ok(Some(Err(err))) => {
                    tracing::error!(context = "API_ROUTE_ERROR", error = %err, "upstream failed mid-stream");
                    yield Ok(error_part(&err.to_string()));
                    return;
                }
                Ok(None) => {
                    yield Ok(finish_part("stop"));
                    return;
                }
                Err(_) => {
                    tracing::warn!(?limit, "chat stream exceeded max duration");
                    yield Ok(error_part(&ServerError::Timeout(limit).to_string()));
                    return;
                }
            }
        }
    }
}
