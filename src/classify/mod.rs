//! Request classification subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → context.rs (peer address, headers, URL; X-Forwarded-For resolution)
//!     → url.rs (utm_source, highlighted text fragment)
//!     → classifier.rs (UTM path, then IP + UA crawl path, first match wins)
//!     → result.rs (ClassificationResult, at most one per request)
//! ```
//!
//! # Design Decisions
//! - Pure: no I/O, no shared mutable state, safe to run concurrently
//! - Absent inputs (no UA, no query) are treated as empty, never as errors

pub mod classifier;
pub mod context;
pub mod result;
pub mod url;

pub use classifier::classify;
pub use context::RequestContext;
pub use result::{ClassificationResult, EventType, Intent};
