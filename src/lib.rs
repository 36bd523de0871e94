//! ABACUS chat client and model proxy.
//!
//! The client keeps one conversation in a [`session::Session`] and drives
//! questions through [`pipeline`]; the UI shell (behind the `desktop`, `web`
//! or `mobile` features) renders it. [`server`] hosts the HTTP proxy in
//! front of the upstream model.

pub mod ai;
pub mod config;
pub mod data_stream;
pub mod logging;
pub mod markdown;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod session;
pub mod suggestions;
pub mod types;

#[cfg(feature = "dioxus")]
pub mod ui;
#[cfg(feature = "dioxus")]
pub mod views;
