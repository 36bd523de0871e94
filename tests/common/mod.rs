//! Shared fixtures: a scripted upstream model and in-process HTTP servers.

#![allow(dead_code)]

use abacus::ai::ChatError;
use abacus::ai::providers::{ModelProvider, PromptMessage, TextStream};
use abacus::config::ServerConfig;
use abacus::server;
use async_trait::async_trait;
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One scripted upstream reply.
#[derive(Clone, Debug)]
pub enum Script {
    /// Yields each chunk in order.
    Chunks(Vec<&'static str>),
    /// Yields the chunks, then fails mid-stream.
    ChunksThenError(Vec<&'static str>, &'static str),
    /// Fails before producing any output.
    Refuse(&'static str),
    /// Yields the chunks with a pause before each.
    Slow(Vec<&'static str>, Duration),
}

/// Upstream model stand-in that records every call it receives.
pub struct ScriptedProvider {
    script: Script,
    pub calls: Mutex<Vec<(String, Vec<PromptMessage>)>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<PromptMessage>)> {
        self.calls.lock().unwrap().clone()
    }
}

fn owned(chunks: &[&'static str]) -> Vec<Result<String, ChatError>> {
    chunks.iter().map(|chunk| Ok(chunk.to_string())).collect()
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn stream_chat(
        &self,
        system: &str,
        messages: Vec<PromptMessage>,
    ) -> Result<TextStream, ChatError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), messages));

        match self.script.clone() {
            Script::Chunks(chunks) => Ok(Box::pin(futures::stream::iter(owned(&chunks)))),
            Script::ChunksThenError(chunks, message) => {
                let mut items = owned(&chunks);
                items.push(Err(ChatError::Provider(message.to_string())));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Script::Refuse(message) => Err(ChatError::Provider(message.to_string())),
            Script::Slow(chunks, pause) => {
                let stream = async_stream::stream! {
                    for chunk in chunks {
                        tokio::time::sleep(pause).await;
                        yield Ok::<String, ChatError>(chunk.to_string());
                    }
                };
                Ok(Box::pin(stream))
            }
        }
    }
}

/// A running in-process server; dropping the handle leaves it running until
/// the test runtime ends.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Serves an arbitrary router on an ephemeral localhost port.
pub async fn spawn_router(app: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .unwrap();
    });

    TestServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    }
}

/// Runs the ABACUS proxy in front of `provider`.
pub async fn spawn_proxy(provider: Arc<ScriptedProvider>, max_duration: Duration) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let config = ServerConfig {
        bind_addr: addr,
        allowed_origins: Some(vec!["http://localhost:3000".to_string()]),
        max_duration,
        provider: None,
    };

    tokio::spawn(async move {
        server::serve_on(listener, &config, provider, async {
            shutdown_rx.await.ok();
        })
        .await
        .unwrap();
    });

    TestServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    }
}
