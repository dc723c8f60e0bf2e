//! Traffic event emission subsystem.
//!
//! # Data Flow
//! ```text
//! ClassificationResult (request path)
//!     → payload.rs (TrafficEvent JSON shape)
//!     → emitter.rs EventEmitter::emit (try_send, returns immediately)
//!     → bounded queue
//!     → emitter.rs EventDispatcher (background task)
//!     → detached POST per event, bearer auth, short timeout
//!     → collector
//! ```

pub mod emitter;
pub mod payload;

use thiserror::Error;

pub use emitter::{EventDispatcher, EventEmitter};
pub use payload::TrafficEvent;

/// Errors from building the emitter or delivering an event.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Collector endpoint is not a valid URL.
    #[error("invalid collector endpoint: {0}")]
    InvalidEndpoint(String),

    /// HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, timeout or body error.
    #[error("collector request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Collector answered with a non-2xx status.
    #[error("collector returned status {0}")]
    Status(u16),
}
