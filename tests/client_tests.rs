//! Integration tests for the completion clients and the submission pipeline
//! against live local endpoints.

mod common;

use abacus::ai::providers::{CompatClient, PromptMessage};
use abacus::ai::{AskClient, ChatError, ChatStreamClient, Completion};
use abacus::data_stream::{DATA_STREAM_HEADER, error_part, finish_part, text_part};
use abacus::pipeline::{self, APOLOGY, Settled};
use abacus::session::Session;
use abacus::types::{ChatMessage, Role};
use axum::Json;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use axum::routing::post;
use common::{Script, ScriptedProvider, spawn_proxy, spawn_router};
use futures::StreamExt;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod ask_client {
    use super::*;

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let recorded = Arc::new(Mutex::new(Vec::<Value>::new()));
        let sink = recorded.clone();
        let app = Router::new().route(
            "/ask",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    Json(json!({ "answer": "ABACUS catalogs applications." }))
                }
            }),
        );
        let server = spawn_router(app).await;

        let client = AskClient::new(&format!("{}/", server.url()));
        let answer = client.complete("What is ABACUS?", &[]).await.unwrap();
        assert_eq!(answer, "ABACUS catalogs applications.");
        assert_eq!(
            recorded.lock().unwrap().as_slice(),
            &[json!({ "question": "What is ABACUS?" })]
        );
        server.shutdown();
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let app = Router::new().route(
            "/ask",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream unavailable") }),
        );
        let server = spawn_router(app).await;

        let err = AskClient::new(&server.url())
            .complete("hi", &[])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::Status {
                status: 502,
                body: "upstream unavailable".into()
            }
        );
        server.shutdown();
    }

    #[tokio::test]
    async fn test_missing_answer_is_a_payload_error() {
        let app = Router::new().route("/ask", post(|| async { Json(json!({ "result": "?" })) }));
        let server = spawn_router(app).await;

        let err = AskClient::new(&server.url())
            .complete("hi", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Payload(_)));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_transport_error() {
        let err = AskClient::new("http://127.0.0.1:9")
            .complete("hi", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }
}

mod chat_stream_client {
    use super::*;

    fn framed(body: String) -> ([(&'static str, &'static str); 1], String) {
        ([(DATA_STREAM_HEADER, "v1")], body)
    }

    #[tokio::test]
    async fn test_sends_history_and_style() {
        let recorded = Arc::new(Mutex::new(Vec::<Value>::new()));
        let sink = recorded.clone();
        let app = Router::new().route(
            "/api/chat",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    framed(format!("{}{}", text_part("Sure."), finish_part("stop")))
                }
            }),
        );
        let server = spawn_router(app).await;

        let history = vec![
            ChatMessage::user("First question"),
            ChatMessage::assistant("First answer"),
            ChatMessage::system("an earlier failure"),
        ];
        let client = ChatStreamClient::new(&server.url(), "compute");
        let answer = client.complete("Second question", &history).await.unwrap();
        assert_eq!(answer, "Sure.");

        let sent = recorded.lock().unwrap()[0].clone();
        assert_eq!(
            sent,
            json!({
                "messages": [
                    { "role": "user", "content": "First question" },
                    { "role": "assistant", "content": "First answer" },
                    { "role": "user", "content": "Second question" }
                ],
                "data": { "responseStyle": "compute" }
            })
        );
        server.shutdown();
    }

    #[tokio::test]
    async fn test_error_part_fails_the_call() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async { framed(format!("{}{}", text_part("Half"), error_part("quota exceeded"))) }),
        );
        let server = spawn_router(app).await;

        let err = ChatStreamClient::new(&server.url(), "detailed")
            .complete("hi", &[])
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::Stream("quota exceeded".into()));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_plain_text_body_without_header() {
        let app = Router::new().route("/api/chat", post(|| async { "Just text, no framing." }));
        let server = spawn_router(app).await;

        let answer = ChatStreamClient::new(&server.url(), "detailed")
            .complete("hi", &[])
            .await
            .unwrap();
        assert_eq!(answer, "Just text, no framing.");
        server.shutdown();
    }

    #[tokio::test]
    async fn test_through_the_proxy() {
        let provider = ScriptedProvider::new(Script::Chunks(vec!["Über", " ", "résumé ✓"]));
        let proxy = spawn_proxy(provider.clone(), Duration::from_secs(5)).await;

        let answer = ChatStreamClient::new(&proxy.url(), "create")
            .complete("Say something", &[])
            .await
            .unwrap();
        assert_eq!(answer, "Über résumé ✓");
        assert_eq!(provider.calls()[0].1, vec![PromptMessage::user("Say something")]);
        proxy.shutdown();
    }
}

mod compat_client {
    use super::*;

    #[tokio::test]
    async fn test_streams_sse_deltas() {
        let auth = Arc::new(Mutex::new(None::<String>));
        let seen_auth = auth.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: axum::http::HeaderMap, Json(body): Json<Value>| {
                let seen_auth = seen_auth.clone();
                async move {
                    *seen_auth.lock().unwrap() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    assert_eq!(body["stream"], true);
                    assert_eq!(body["messages"][0]["role"], "system");
                    assert_eq!(body["messages"][1]["content"], "hello");
                    concat!(
                        "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
                        "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
                        "data: [DONE]\n\n",
                    )
                }
            }),
        );
        let server = spawn_router(app).await;

        let client = CompatClient::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-model".into(),
            Some("secret".into()),
        );
        let pieces: Vec<String> = client
            .stream("be brief", vec![PromptMessage::user("hello")])
            .await
            .unwrap()
            .map(|piece| piece.unwrap())
            .collect()
            .await;
        assert_eq!(pieces, vec!["Hi".to_string(), " there".to_string()]);
        assert_eq!(auth.lock().unwrap().as_deref(), Some("Bearer secret"));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_character_split_across_chunks_survives() {
        let event = "data: {\"choices\":[{\"delta\":{\"content\":\"r\u{e9}sum\u{e9}\"}}]}\n\n";
        let bytes = event.as_bytes().to_vec();
        // Cut right after the lead byte of the first 'é'.
        let cut = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let bytes = bytes.clone();
                async move {
                    let chunks = async_stream::stream! {
                        yield Ok::<Bytes, Infallible>(Bytes::copy_from_slice(&bytes[..cut]));
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        yield Ok(Bytes::copy_from_slice(&bytes[cut..]));
                        yield Ok(Bytes::from_static(b"data: [DONE]\n\n"));
                    };
                    Body::from_stream(chunks)
                }
            }),
        );
        let server = spawn_router(app).await;

        let client = CompatClient::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-model".into(),
            None,
        );
        let pieces: Vec<String> = client
            .stream("sys", vec![PromptMessage::user("cv")])
            .await
            .unwrap()
            .map(|piece| piece.unwrap())
            .collect()
            .await;
        assert_eq!(pieces.concat(), "r\u{e9}sum\u{e9}");
        server.shutdown();
    }

    #[tokio::test]
    async fn test_error_event_ends_the_stream() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                concat!(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Par\"}}]}\n\n",
                    "data: {\"error\":{\"message\":\"overloaded\"}}\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\n",
                )
            }),
        );
        let server = spawn_router(app).await;

        let client = CompatClient::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-model".into(),
            None,
        );
        let items: Vec<Result<String, ChatError>> = client
            .stream("sys", vec![PromptMessage::user("x")])
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(
            items,
            vec![Ok("Par".to_string()), Err(ChatError::Provider("overloaded".into()))]
        );
        server.shutdown();
    }

    #[tokio::test]
    async fn test_upstream_status_is_reported() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let server = spawn_router(app).await;

        let client = CompatClient::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-model".into(),
            None,
        );
        let err = match client.stream("sys", vec![PromptMessage::user("x")]).await {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };
        assert!(matches!(err, ChatError::Status { status: 401, .. }));
        server.shutdown();
    }
}

mod pipeline_end_to_end {
    use super::*;

    #[tokio::test]
    async fn test_successful_submission_through_ask() {
        let app = Router::new().route(
            "/ask",
            post(|| async { Json(json!({ "answer": "ABACUS is X." })) }),
        );
        let server = spawn_router(app).await;
        let client = AskClient::new(&server.url());

        let mut session = Session::new();
        session.set_input("  What is ABACUS?  ");
        let outcome = pipeline::submit(&mut session, &client).await;

        assert_eq!(outcome, Some(Settled::Answered));
        assert!(!session.is_loading());
        assert_eq!(session.input(), "");
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is ABACUS?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "ABACUS is X.");
        assert_ne!(messages[0].id, messages[1].id);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_failed_submission_appends_one_system_message() {
        let client = AskClient::new("http://127.0.0.1:9");

        let mut session = Session::new();
        session.set_input("Hello");
        let outcome = pipeline::submit(&mut session, &client).await;

        assert_eq!(outcome, Some(Settled::Failed));
        assert!(!session.is_loading());
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::System);
        assert!(messages[1].content.starts_with(APOLOGY));
        assert!(messages[1].content.contains("**Error:**"));
    }

    #[tokio::test]
    async fn test_proxy_failure_then_recovery() {
        let failing = ScriptedProvider::new(Script::Refuse("model offline"));
        let proxy = spawn_proxy(failing, Duration::from_secs(5)).await;
        let client = ChatStreamClient::new(&proxy.url(), "detailed");

        let mut session = Session::new();
        session.set_input("First");
        assert_eq!(
            pipeline::submit(&mut session, &client).await,
            Some(Settled::Failed)
        );
        assert!(session.messages()[1].content.contains("500"));
        proxy.shutdown();

        let working = ScriptedProvider::new(Script::Chunks(vec!["Back online."]));
        let proxy = spawn_proxy(working.clone(), Duration::from_secs(5)).await;
        let client = ChatStreamClient::new(&proxy.url(), "detailed");

        session.set_input("Second");
        assert_eq!(
            pipeline::submit(&mut session, &client).await,
            Some(Settled::Answered)
        );
        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::System, Role::User, Role::Assistant]
        );

        // The failure message is not replayed to the model.
        let sent = &working.calls()[0].1;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.role == Role::User));
        proxy.shutdown();
    }
}
