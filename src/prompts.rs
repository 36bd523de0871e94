//! System prompts for each response style the proxy knows about.

/// Style used when a request names none, or one that is not recognised.
pub const DEFAULT_STYLE: &str = "detailed";

const RESEARCH_PROMPT: &str = "You are a helpful AI research assistant. Your responses should be detailed, well-sourced, and comprehensive.";

const COMPUTE_PROMPT: &str = "You are a helpful AI computation assistant. Your responses should be technical, accurate, and focused on solving complex problems.";

const CREATE_PROMPT: &str = "You are a helpful AI creative assistant. Your responses should be imaginative, inspiring, and help users generate new ideas and content.";

const DETAILED_PROMPT: &str = r#"You are ABACUS, an assistant for navigating the organization's technology landscape.

When responding:
- Be thorough but stay on the question asked
- Format with markdown when appropriate
- Say so plainly when you do not know something"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStyle {
    Research,
    Compute,
    Create,
    Detailed,
}

impl ResponseStyle {
    /// Unknown or missing keys resolve to the default style.
    pub fn resolve(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            Some("research") => Self::Research,
            Some("compute") => Self::Compute,
            Some("create") => Self::Create,
            _ => Self::Detailed,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Compute => "compute",
            Self::Create => "create",
            Self::Detailed => DEFAULT_STYLE,
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Research => RESEARCH_PROMPT,
            Self::Compute => COMPUTE_PROMPT,
            Self::Create => CREATE_PROMPT,
            Self::Detailed => DETAILED_PROMPT,
        }
    }
}
