use thiserror::Error;

/// Every way a completion call can fail. The pipeline collapses all of them
/// into a single system message, so the display text is what the user reads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("{0}")]
    Transport(String),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Payload(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl ChatError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload(message.into())
    }

    pub fn status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Status {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Payload(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Payload(err.to_string())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
