//! AI module for ABACUS
//!
//! Client side, a [`Completion`] answers one submitted question; two
//! implementations cover the ABACUS endpoints. Server side, a
//! [`providers::ModelProvider`] streams text from the configured upstream
//! model (OpenAI-compatible endpoint, or OpenAI/Anthropic/Ollama via Rig).
//!
//! # Architecture
//!
//! - `ask` - `POST /ask` with a single question
//! - `stream` - `POST /api/chat` with the conversation, streamed reply
//! - `client` - the [`Completion`] seam and selection from config
//! - `providers` - upstream model clients used by the proxy
//!
//! # Usage
//!
//! ```rust,no_run
//! use abacus::ai::{AskClient, Completion};
//!
//! # async fn example() -> Result<(), abacus::ai::ChatError> {
//! let client = AskClient::new("http://localhost:8000");
//! let answer = client.complete("What is ABACUS?", &[]).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod ask;
mod client;
mod error;
pub mod providers;
mod stream;

pub use ask::AskClient;
pub use client::{Completion, completion_from_config};
pub use error::{ChatError, ChatResult};
pub use stream::{ChatStreamClient, StreamCollector};
