//! Environment-driven configuration for the chat client and the proxy server.
//!
//! Values come from the process environment, which [`load_dotenv`] seeds from
//! `.env` (desktop dev) or the bundled `assets/config.env` defaults.

use crate::server::{Result, ServerError};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Bundled defaults for builds that ship without a `.env` (mobile, web).
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_SUGGESTIONS: &str = "assets/prompts.json";
pub const DEFAULT_APP_NAME: &str = "ABACUS";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
pub const DEFAULT_MAX_DURATION_SECS: u64 = 30;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:latest";
pub const DEFAULT_COMPAT_MODEL: &str = "gpt-4o";

#[cfg(not(target_arch = "wasm32"))]
pub fn load_dotenv() {
    // First try to load from .env file (desktop dev)
    if dotenvy::dotenv().is_ok() {
        return;
    }

    load_bundled_config();
}

#[cfg(target_arch = "wasm32")]
pub fn load_dotenv() {
    load_bundled_config();
}

fn load_bundled_config() {
    for (key, value) in parse_env_lines(BUNDLED_CONFIG) {
        // Only set if not already set (allow env override)
        if env::var(&key).is_err() {
            // SAFETY: called from `main` before the runtime or any other thread starts
            unsafe {
                env::set_var(key, value);
            }
        }
    }
}

/// `KEY=VALUE` lines; blank lines and `#` comments are skipped.
pub fn parse_env_lines(source: &str) -> Vec<(String, String)> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// How the client talks to the completion endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChatMode {
    /// `POST /ask` with `{question}`, answered by `{answer}`.
    #[default]
    Ask,
    /// `POST /api/chat` with the message array, answered by a text stream.
    Stream,
}

impl ChatMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ask" => Some(Self::Ask),
            "stream" | "chat" => Some(Self::Stream),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub mode: ChatMode,
    pub response_style: String,
    pub suggestions: String,
    pub app_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            mode: ChatMode::Ask,
            response_style: crate::prompts::DEFAULT_STYLE.to_string(),
            suggestions: DEFAULT_SUGGESTIONS.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mode = match non_empty(lookup("ABACUS_CHAT_MODE")) {
            Some(raw) => ChatMode::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "unknown ABACUS_CHAT_MODE, using ask");
                ChatMode::Ask
            }),
            None => defaults.mode,
        };

        Self {
            api_url: non_empty(lookup("ABACUS_API_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            mode,
            response_style: non_empty(lookup("ABACUS_RESPONSE_STYLE"))
                .unwrap_or(defaults.response_style),
            suggestions: non_empty(lookup("ABACUS_SUGGESTIONS")).unwrap_or(defaults.suggestions),
            app_name: non_empty(lookup("APP_NAME")).unwrap_or(defaults.app_name),
        }
    }
}

/// Upstream model provider selection, in priority order.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderSettings {
    /// Any OpenAI-compatible chat-completions endpoint, streamed over SSE.
    Compat {
        endpoint: String,
        model: String,
        api_key: Option<String>,
    },
    OpenAI {
        api_key: String,
        model: String,
    },
    Anthropic {
        api_key: String,
        model: String,
    },
    Ollama {
        model: String,
    },
}

impl ProviderSettings {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Option<Self> {
        if let Some(endpoint) = non_empty(lookup("LLM_ENDPOINT")) {
            return Some(Self::Compat {
                endpoint,
                model: non_empty(lookup("LLM_MODEL"))
                    .unwrap_or_else(|| DEFAULT_COMPAT_MODEL.to_string()),
                api_key: non_empty(lookup("LLM_API_KEY")),
            });
        }

        if let Some(api_key) = non_empty(lookup("OPENAI_API_KEY")) {
            return Some(Self::OpenAI {
                api_key,
                model: non_empty(lookup("OPENAI_MODEL"))
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            });
        }

        if let Some(api_key) = non_empty(lookup("ANTHROPIC_API_KEY")) {
            return Some(Self::Anthropic {
                api_key,
                model: non_empty(lookup("ANTHROPIC_MODEL"))
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            });
        }

        if lookup("LLM_USE_OLLAMA").is_some_and(|raw| parse_flag(&raw)) {
            // Ollama endpoint is configured via OLLAMA_HOST; the Rig client reads it.
            return Some(Self::Ollama {
                model: non_empty(lookup("LLM_MODEL"))
                    .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            });
        }

        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// `None` means any origin.
    pub allowed_origins: Option<Vec<String>>,
    pub max_duration: Duration,
    pub provider: Option<ProviderSettings>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_raw = non_empty(lookup("ABACUS_BIND")).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e| ServerError::config_error(format!("invalid ABACUS_BIND {bind_raw:?}: {e}")))?;

        let origins_raw = non_empty(lookup("ALLOWED_ORIGINS"))
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());
        let allowed_origins = if origins_raw == "*" {
            None
        } else {
            Some(
                origins_raw
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        };

        let max_duration_secs = match non_empty(lookup("ABACUS_MAX_DURATION_SECS")) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| {
                    ServerError::config_error(format!("invalid ABACUS_MAX_DURATION_SECS {raw:?}: {e}"))
                })?,
            None => DEFAULT_MAX_DURATION_SECS,
        };

        Ok(Self {
            bind_addr,
            allowed_origins,
            max_duration: Duration::from_secs(max_duration_secs),
            provider: ProviderSettings::from_lookup(&lookup),
        })
    }
}
