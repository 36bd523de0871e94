use crate::session::Session;
use crate::types::Suggestion;
use dioxus::prelude::*;

/// Shown while the conversation is empty.
#[component]
pub fn Welcome(session: Signal<Session>, app_name: String, suggestions: Vec<Suggestion>) -> Element {
    let cards: Vec<(String, Suggestion)> = suggestions
        .iter()
        .enumerate()
        .map(|(index, suggestion)| (suggestion.key(index), suggestion.clone()))
        .collect();

    rsx! {
        div { class: "welcome",
            h2 { class: "welcome-title", "Welcome to {app_name}" }
            p { class: "welcome-subtitle",
                "Ask about applications, capabilities and technologies, or start from a suggestion."
            }
            if !cards.is_empty() {
                div { class: "suggestion-grid",
                    for (key, suggestion) in cards {
                        SuggestionCard { key: "{key}", session, suggestion }
                    }
                }
            }
        }
    }
}

#[component]
fn SuggestionCard(session: Signal<Session>, suggestion: Suggestion) -> Element {
    let mut session = session;
    let prompt = suggestion.prompt.clone();
    rsx! {
        button {
            class: "suggestion-card",
            r#type: "button",
            onclick: move |_| session.with_mut(|state| state.set_input(prompt.clone())),
            h3 { "{suggestion.title}" }
            p { "{suggestion.prompt}" }
        }
    }
}
