//! Fire-and-forget event emission.
//!
//! # Responsibilities
//! - Turn classification results into collector payloads
//! - Hand them to a background dispatcher without waiting
//! - POST each payload once, with a bounded timeout
//!
//! # Design Decisions
//! - `emit` is synchronous and only does a `try_send`; a full queue drops
//!   the event instead of stalling the request
//! - Each delivery runs in its own task, detached from the request that
//!   produced it, so a client disconnect does not cancel it
//! - In-flight deliveries are capped by a semaphore; the queue absorbs bursts
//! - Failures are logged and counted, never retried

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::{broadcast, mpsc, Semaphore};
use url::Url;

use crate::classify::ClassificationResult;
use crate::config::CollectorConfig;
use crate::events::payload::TrafficEvent;
use crate::events::EmitError;
use crate::observability::metrics;

const MAX_IN_FLIGHT_CAP: usize = 1 << 16;

/// Request-path handle. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::Sender<TrafficEvent>,
}

impl EventEmitter {
    /// Create an emitter and the dispatcher that drains it.
    ///
    /// The dispatcher must be spawned (see [`EventDispatcher::run`]) for
    /// events to leave the process.
    pub fn new(config: &CollectorConfig) -> Result<(Self, EventDispatcher), EmitError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| EmitError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(EmitError::Client)?;

        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let max_in_flight = config.max_in_flight.clamp(1, MAX_IN_FLIGHT_CAP) as u32;

        let dispatcher = EventDispatcher {
            rx,
            client,
            endpoint,
            api_key: config.api_key.clone(),
            in_flight: Arc::new(Semaphore::new(max_in_flight as usize)),
            max_in_flight,
        };

        Ok((Self { tx }, dispatcher))
    }

    /// Queue an event for delivery. Never blocks; returns false if the event
    /// was dropped because the queue is full or the dispatcher has stopped.
    pub fn emit(&self, result: &ClassificationResult) -> bool {
        match self.tx.try_send(TrafficEvent::from(result)) {
            Ok(()) => {
                metrics::record_event("queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                metrics::record_event("dropped");
                tracing::warn!(source = %event.source, "Event queue full, dropping traffic event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                metrics::record_event("dropped");
                tracing::debug!(source = %event.source, "Event dispatcher stopped, dropping traffic event");
                false
            }
        }
    }
}

/// Background side of the emitter: drains the queue and posts events.
#[derive(Debug)]
pub struct EventDispatcher {
    rx: mpsc::Receiver<TrafficEvent>,
    client: Client,
    endpoint: Url,
    api_key: String,
    in_flight: Arc<Semaphore>,
    max_in_flight: u32,
}

impl EventDispatcher {
    /// Run until shutdown, then deliver whatever is still queued.
    ///
    /// Returns once every delivery has finished; each one is bounded by the
    /// collector timeout.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(endpoint = %self.endpoint, "Event dispatcher starting");

        loop {
            tokio::select! {
                event = self.rx.recv() => {
                    match event {
                        Some(event) => self.dispatch(event).await,
                        None => break,
                    }
                }
                _ = shutdown.recv() => {
                    self.rx.close();
                    while let Some(event) = self.rx.recv().await {
                        self.dispatch(event).await;
                    }
                    tracing::info!("Event dispatcher received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        // Every permit back means no delivery is still running.
        let _ = self.in_flight.acquire_many(self.max_in_flight).await;
        tracing::info!("Event dispatcher stopped");
    }

    /// Spawn one delivery. Waits only for an in-flight slot.
    async fn dispatch(&self, event: TrafficEvent) {
        let Ok(permit) = self.in_flight.clone().acquire_owned().await else {
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();

        tokio::spawn(async move {
            let start = Instant::now();
            let source = event.source.clone();
            match deliver(&client, &endpoint, &api_key, &event).await {
                Ok(()) => {
                    metrics::record_event("sent");
                    tracing::debug!(source = %source, elapsed = ?start.elapsed(), "Traffic event delivered");
                }
                Err(e) => {
                    metrics::record_event("failed");
                    tracing::warn!(source = %source, error = %e, "Traffic event delivery failed");
                }
            }
            metrics::record_dispatch_duration(start);
            drop(permit);
        });
    }
}

/// POST one event to the collector.
pub async fn deliver(client: &Client, endpoint: &Url, api_key: &str, event: &TrafficEvent) -> Result<(), EmitError> {
    let response = client
        .post(endpoint.clone())
        .bearer_auth(api_key)
        .json(event)
        .send()
        .await
        .map_err(EmitError::Request)?;

    let status = response.status();
    if !status.is_success() {
        return Err(EmitError::Status(status.as_u16()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{EventType, Intent};

    fn config(endpoint: &str, capacity: usize) -> CollectorConfig {
        CollectorConfig {
            endpoint: endpoint.to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 1,
            queue_capacity: capacity,
            max_in_flight: 4,
        }
    }

    fn result() -> ClassificationResult {
        ClassificationResult {
            filter_name: "google".into(),
            intent: Intent::Crawl,
            event_type: EventType::Crawl,
            destination_url: "http://example.com/".into(),
            user_agent: Some("Googlebot/2.1".into()),
            highlighted_text: None,
            headers: None,
        }
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = EventEmitter::new(&config("not a url", 8)).unwrap_err();
        assert!(matches!(err, EmitError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let (emitter, _dispatcher) = EventEmitter::new(&config("http://127.0.0.1:9/traffic", 2)).unwrap();
        assert!(emitter.emit(&result()));
        assert!(emitter.emit(&result()));
        assert!(!emitter.emit(&result()));
    }

    #[test]
    fn test_stopped_dispatcher_drops() {
        let (emitter, dispatcher) = EventEmitter::new(&config("http://127.0.0.1:9/traffic", 2)).unwrap();
        drop(dispatcher);
        assert!(!emitter.emit(&result()));
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_swallowed() {
        // Port 9 (discard) is closed on test hosts; delivery fails fast.
        let (emitter, dispatcher) = EventEmitter::new(&config("http://127.0.0.1:9/traffic", 8)).unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(dispatcher.run(shutdown_rx));

        assert!(emitter.emit(&result()));
        let _ = shutdown_tx.send(());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_deliveries() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use axum::{extract::State, http::StatusCode, routing::post, Router};

        async fn slow_collector(State(received): State<Arc<AtomicUsize>>) -> StatusCode {
            tokio::time::sleep(Duration::from_millis(300)).await;
            received.fetch_add(1, Ordering::SeqCst);
            StatusCode::OK
        }

        let received = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/traffic", post(slow_collector))
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let (emitter, dispatcher) = EventEmitter::new(&config(&format!("http://{}/traffic", addr), 8)).unwrap();
        for _ in 0..3 {
            assert!(emitter.emit(&result()));
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let _ = shutdown_tx.send(());
        dispatcher.run(shutdown_rx).await;

        assert_eq!(received.load(Ordering::SeqCst), 3);
    }
}
