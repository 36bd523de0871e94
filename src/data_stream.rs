//! Line protocol used by `/api/chat` responses.
//!
//! Each line is `<code>:<json>`: `0` carries a text delta, `3` an error
//! message, `d` ends the message. Step markers (`e`, `f`) and unknown codes
//! are ignored so newer producers can add part types.

use serde_json::json;

/// Response header announcing the line protocol; its value is the version.
pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";
pub const DATA_STREAM_VERSION: &str = "v1";

#[derive(Clone, Debug, PartialEq)]
pub enum StreamPart {
    Text(String),
    Error(String),
    Finish,
    Other,
}

pub fn parse_stream_part(line: &str) -> Option<StreamPart> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (code, payload) = line.split_once(':')?;
    let part = match code {
        "0" => StreamPart::Text(serde_json::from_str::<String>(payload).ok()?),
        "3" => StreamPart::Error(
            serde_json::from_str::<String>(payload).unwrap_or_else(|_| payload.to_string()),
        ),
        "d" => StreamPart::Finish,
        _ => StreamPart::Other,
    };
    Some(part)
}

pub fn text_part(text: &str) -> String {
    format!("0:{}\n", json!(text))
}

pub fn error_part(message: &str) -> String {
    format!("3:{}\n", json!(message))
}

pub fn finish_part(reason: &str) -> String {
    format!("d:{}\n", json!({ "finishReason": reason }))
}
