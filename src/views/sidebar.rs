use crate::session::Session;
use dioxus::prelude::*;

#[component]
pub fn Sidebar(session: Signal<Session>, app_name: String) -> Element {
    let mut session = session;
    // Newest question first.
    let history: Vec<(String, String)> = session
        .read()
        .query_history()
        .into_iter()
        .rev()
        .map(|message| (message.id.clone(), message.content.clone()))
        .collect();

    rsx! {
        aside { class: "sidebar",
            div { class: "sidebar-header",
                h1 { class: "app-name", "{app_name}" }
            }
            button {
                class: "btn btn-primary new-chat",
                r#type: "button",
                onclick: move |_| session.with_mut(Session::clear),
                "New Chat"
            }
            div { class: "history",
                h2 { class: "history-title", "History" }
                if history.is_empty() {
                    p { class: "history-empty", "Questions you ask appear here." }
                }
                for (id, question) in history.into_iter() {
                    HistoryItem { key: "{id}", session, question }
                }
            }
        }
    }
}

#[component]
fn HistoryItem(session: Signal<Session>, question: String) -> Element {
    let mut session = session;
    let prompt = question.clone();
    rsx! {
        button {
            class: "history-item",
            r#type: "button",
            title: "{question}",
            onclick: move |_| session.with_mut(|state| state.set_input(prompt.clone())),
            "{question}"
        }
    }
}
