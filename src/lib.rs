//! Doppler traffic proxy library.
//!
//! Classifies inbound web requests as AI agent traffic (crawlers and
//! click-throughs from AI assistants), reports matches to a remote collector
//! without delaying the response, and forwards every request to the site.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server ──▶ http::middleware ──▶ proxy_handler ──▶ Upstream
//!                                     │
//!                                     ▼
//!                              monitor::TrafficMonitor
//!                               │                  │
//!                               ▼                  ▼
//!                  classify::classify      events::EventEmitter ──▶ queue
//!                  (filters snapshot)                                  │
//!                               ▲                                      ▼
//!                               │                       events::EventDispatcher ──▶ Collector
//!                    filters::FilterStore
//!                    (swapped by loader on file change / SIGHUP / admin)
//! ```

// Core
pub mod classify;
pub mod events;
pub mod filters;
pub mod monitor;

// Hosting layer
pub mod admin;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use classify::{classify, ClassificationResult, RequestContext};
pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use monitor::TrafficMonitor;
