//! In-memory chat session.
//!
//! The store only knows how to hold state; the submission pipeline in
//! [`crate::pipeline`] decides when to mutate it.

use crate::types::{ChatMessage, Role};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    messages: Vec<ChatMessage>,
    input: String,
    is_loading: bool,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Bumped by every [`Session::clear`]; submissions compare against it to
    /// detect that the conversation they belong to is gone.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// "New Chat". Leaves `is_loading` alone: an outstanding call keeps running.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.input.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    /// Questions asked so far, oldest first.
    pub fn query_history(&self) -> Vec<&ChatMessage> {
        self.messages
            .iter()
            .filter(|msg| msg.role == Role::User)
            .collect()
    }
}
