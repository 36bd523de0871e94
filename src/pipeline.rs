//! Submission pipeline: turns the session's input into a question, asks the
//! completion collaborator, and records exactly one terminal message.
//!
//! [`submit`] runs the whole thing against a `&mut Session`. Reactive UIs that
//! cannot hold a borrow across the network call use [`begin`] and [`settle`]
//! around their own await instead.

use crate::ai::{ChatError, ChatResult, Completion};
use crate::session::Session;
use crate::types::{ChatMessage, Role};

/// Prefix of the system message appended when a submission fails.
pub const APOLOGY: &str =
    "I'm sorry, but I've encountered an issue. Please check your connection or try again later.";

/// An outstanding submission.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    question: String,
    history: Vec<ChatMessage>,
    generation: u64,
}

impl Submission {
    pub fn question(&self) -> &str {
        &self.question
    }

    /// User/assistant messages that preceded the question.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What [`settle`] did with a finished submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    Answered,
    Failed,
    /// The session was cleared while the call was in flight; nothing appended.
    Discarded,
}

pub fn error_message(err: &ChatError) -> String {
    format!("{APOLOGY} \n\n**Error:** {err}")
}

/// Appends the user message, clears the input and raises the loading flag.
/// Returns `None` (and touches nothing) for blank input or while another
/// submission is outstanding.
pub fn begin(session: &mut Session) -> Option<Submission> {
    if session.is_loading() {
        return None;
    }
    let question = session.input().trim().to_string();
    if question.is_empty() {
        return None;
    }

    let history = session
        .messages()
        .iter()
        .filter(|msg| matches!(msg.role, Role::User | Role::Assistant))
        .cloned()
        .collect();

    session.append(ChatMessage::user(question.clone()));
    session.set_input(String::new());
    session.set_loading(true);

    tracing::debug!(generation = session.generation(), "chat submission started");

    Some(Submission {
        question,
        history,
        generation: session.generation(),
    })
}

/// Records the outcome of `submission` and lowers the loading flag.
pub fn settle(
    session: &mut Session,
    submission: Submission,
    outcome: ChatResult<String>,
) -> Settled {
    session.set_loading(false);

    if submission.generation != session.generation() {
        tracing::debug!(
            submitted = submission.generation,
            current = session.generation(),
            ok = outcome.is_ok(),
            "discarding reply for a cleared conversation"
        );
        return Settled::Discarded;
    }

    match outcome {
        Ok(answer) => {
            session.append(ChatMessage::assistant(answer));
            Settled::Answered
        }
        Err(err) => {
            tracing::error!(error = %err, error_debug = ?err, "chat submission failed");
            session.append(ChatMessage::new(Role::System, error_message(&err)));
            Settled::Failed
        }
    }
}

/// Runs a full submission. Never fails: errors end up in the message list.
pub async fn submit<C>(session: &mut Session, completion: &C) -> Option<Settled>
where
    C: Completion + ?Sized,
{
    let submission = begin(session)?;
    let outcome = completion
        .complete(submission.question(), submission.history())
        .await;
    Some(settle(session, submission, outcome))
}
