use crate::ai::Completion;
use crate::markdown::markdown_to_html;
use crate::pipeline;
use crate::session::Session;
use crate::types::{ChatMessage, Role, Suggestion};
use crate::ui::CompletionHandle;
use crate::views::Welcome;
use dioxus::events::Key;
use dioxus::prelude::*;

/// Starts a submission from the current input and settles it once the
/// completion call returns. Does nothing while a call is outstanding.
fn submit_question(mut session: Signal<Session>, completion: CompletionHandle) {
    let Some(submission) = session.with_mut(pipeline::begin) else {
        return;
    };

    spawn(async move {
        let result = completion
            .0
            .complete(submission.question(), submission.history())
            .await;
        session.with_mut(|state| pipeline::settle(state, submission, result));
    });
}

#[component]
pub fn ChatView(
    session: Signal<Session>,
    app_name: String,
    suggestions: Vec<Suggestion>,
) -> Element {
    let mut session = session;
    let completion = use_context::<CompletionHandle>();
    let completion_for_key = completion.clone();

    let (messages, input, is_loading) = {
        let state = session.read();
        (
            state.messages().to_vec(),
            state.input().to_string(),
            state.is_loading(),
        )
    };

    rsx! {
        div { class: "main-container",
            div { class: "chat-wrap",
                if messages.is_empty() {
                    Welcome { session, app_name, suggestions }
                } else {
                    div { id: "chat-list", class: "chat-list",
                        for message in messages.iter() {
                            MessageRow { key: "{message.id}", message: message.clone() }
                        }
                        if is_loading {
                            div { class: "message-row assistant",
                                div { class: "shimmer-line",
                                    span { class: "shimmer-text", "Processing…" }
                                }
                            }
                        }
                    }
                }
            }

            form { class: "composer no-divider",
                div { class: "composer-inner",
                    div { class: "hstack",
                        textarea {
                            rows: "1",
                            placeholder: "Ask ABACUS a question",
                            value: "{input}",
                            disabled: is_loading,
                            autofocus: true,
                            oninput: move |ev| session.with_mut(|state| state.set_input(ev.value())),
                            onkeydown: move |ev| {
                                if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                    ev.prevent_default();
                                    submit_question(session, completion_for_key.clone());
                                }
                            },
                        }
                        button {
                            class: "btn btn-primary",
                            r#type: "button",
                            disabled: is_loading || input.trim().is_empty(),
                            onclick: move |_| submit_question(session, completion.clone()),
                            "Send"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn MessageRow(message: ChatMessage) -> Element {
    let role = message.role.as_str();
    let timestamp = message.display_time();

    rsx! {
        div { class: "message-row {role}",
            div { class: "message-stack",
                div { class: "bubble {role}",
                    {match message.role {
                        Role::User => rsx! { "{message.content}" },
                        Role::Assistant => rsx! { AssistantBubble { content: message.content.clone() } },
                        Role::System => rsx! {
                            div { class: "md error", dangerous_inner_html: markdown_to_html(&message.content) }
                        },
                    }}
                }
                if let Some(ts) = timestamp {
                    div { class: "message-meta", "{ts}" }
                }
            }
        }
    }
}

#[component]
fn AssistantBubble(content: String) -> Element {
    let content_html = markdown_to_html(&content);
    let on_copy = move |_| {
        let raw = content.clone();
        spawn(async move {
            #[cfg(any(feature = "desktop", feature = "mobile"))]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    if let Err(err) = cb.set_text(raw) {
                        tracing::warn!("copy to clipboard failed: {err}");
                    }
                }
            }
            #[cfg(not(any(feature = "desktop", feature = "mobile")))]
            drop(raw);
        });
    };

    rsx! {
        div { class: "bubble-controls",
            button { class: "action-btn", title: "Copy markdown", onclick: on_copy, "Copy" }
        }
        div { class: "md", dangerous_inner_html: "{content_html}" }
    }
}
