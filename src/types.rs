use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

static MESSAGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: OffsetDateTime,
}

impl ChatMessage {
    /// Builds a message stamped with the current time and a process-unique id.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let created_at = OffsetDateTime::now_utc();
        Self {
            id: next_message_id(role, created_at),
            role,
            content: content.into(),
            created_at,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Local wall-clock time for the message meta line, e.g. `09:41 AM`.
    pub fn display_time(&self) -> Option<String> {
        let mut datetime = self.created_at;
        if let Ok(offset) = UtcOffset::current_local_offset() {
            datetime = datetime.to_offset(offset);
        }
        datetime.format(MESSAGE_TIME_FORMAT).ok()
    }
}

fn next_message_id(role: Role, created_at: OffsetDateTime) -> String {
    let millis = created_at.unix_timestamp_nanos() / 1_000_000;
    let sequence = MESSAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{role}-{millis}-{sequence}")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub prompt: String,
}

impl Suggestion {
    /// Render key for the card at `position`; titles alone may repeat.
    pub fn key(&self, position: usize) -> String {
        format!("{position}:{}", self.title)
    }
}
