use crate::ai::{Completion, completion_from_config};
use crate::config::ClientConfig;
use crate::session::Session;
use crate::suggestions::load_suggestions;
use crate::views::{ChatView, Sidebar};
use dioxus::prelude::*;
use std::sync::Arc;

const ABACUS_CSS: Asset = asset!("/assets/abacus.css");

/// Completion collaborator shared with every view through context.
#[derive(Clone)]
pub struct CompletionHandle(pub Arc<dyn Completion>);

#[component]
pub fn App() -> Element {
    let config = use_hook(ClientConfig::from_env);
    let app_name = config.app_name.clone();
    let source = config.suggestions.clone();
    use_context_provider(|| CompletionHandle(completion_from_config(&config)));

    let session = use_signal(Session::new);
    let suggestions = use_resource(move || {
        let source = source.clone();
        async move { load_suggestions(&source).await }
    });
    let suggestion_list = suggestions.read().clone().unwrap_or_default();

    rsx! {
        document::Title { "{app_name}" }
        document::Link { rel: "stylesheet", href: ABACUS_CSS }
        div { class: "app-shell",
            Sidebar { session, app_name: app_name.clone() }
            ChatView { session, app_name: app_name.clone(), suggestions: suggestion_list }
        }
    }
}
