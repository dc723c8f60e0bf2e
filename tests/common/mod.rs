//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use doppler_proxy::config::ProxyConfig;
use doppler_proxy::events::EventEmitter;
use doppler_proxy::filters::{AgentFilter, FilterSet, FilterStore};
use doppler_proxy::http::HttpServer;
use doppler_proxy::lifecycle::Shutdown;
use doppler_proxy::monitor::TrafficMonitor;

pub const API_KEY: &str = "test-key";
pub const GPTBOT_UA: &str = "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; GPTBot/1.1; +https://openai.com/gptbot)";

/// An event as received by the collector.
#[derive(Debug)]
pub struct Captured {
    pub authorization: Option<String>,
    pub body: Value,
}

/// OpenAI-style filter: one /28 range, the GPTBot marker, chatgpt.com UTM.
pub fn openai_filter() -> AgentFilter {
    AgentFilter::new(
        "openai",
        vec!["20.15.240.64/28".into()],
        vec!["GPTBot".into()],
        vec!["chatgpt.com".into()],
    )
    .unwrap()
}

pub fn filter_set(filters: Vec<AgentFilter>) -> FilterSet {
    FilterSet::new(filters).unwrap()
}

/// Start a mock upstream. Each response body is the request line it received.
pub async fn start_mock_backend() -> SocketAddr {
    start_slow_backend(Duration::ZERO).await
}

/// Like [`start_mock_backend`], but every response waits `delay` first.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        let head = String::from_utf8_lossy(&buf);
                        let request_line = head.lines().next().unwrap_or_default().to_string();
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            request_line.len(),
                            request_line
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a collector that records every POSTed event and answers `status`.
pub async fn start_collector(status: StatusCode) -> (SocketAddr, mpsc::UnboundedReceiver<Captured>) {
    let (tx, rx) = mpsc::unbounded_channel();

    async fn capture(
        State((tx, status)): State<(mpsc::UnboundedSender<Captured>, StatusCode)>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let _ = tx.send(Captured { authorization, body });
        status
    }

    let app = Router::new().route("/api/traffic", post(capture)).with_state((tx, status));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, rx)
}

/// Start a collector that accepts connections and never answers.
pub async fn start_stalled_collector() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Proxy config pointing at `upstream` and a collector at `collector`.
pub fn proxy_config(upstream: SocketAddr, collector: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.address = upstream.to_string();
    config.collector.endpoint = format!("http://{}/api/traffic", collector);
    config.collector.api_key = API_KEY.into();
    config.collector.timeout_secs = 1;
    config.observability.metrics_enabled = false;
    config
}

/// Start the proxy with a fixed filter set. The listener is bound before
/// this returns, so requests can be sent immediately.
pub async fn start_proxy(mut config: ProxyConfig, filters: FilterSet) -> (SocketAddr, Shutdown) {
    let shutdown = Shutdown::new();

    let store = Arc::new(FilterStore::new(filters));
    let (emitter, dispatcher) = EventEmitter::new(&config.collector).unwrap();
    tokio::spawn(dispatcher.run(shutdown.subscribe()));
    let monitor = Arc::new(TrafficMonitor::new(store, emitter, &config.collector.api_key));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = HttpServer::new(config, monitor);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Next captured event, or None if none arrives within `wait`.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Captured>, wait: Duration) -> Option<Captured> {
    tokio::time::timeout(wait, rx.recv()).await.ok().flatten()
}
