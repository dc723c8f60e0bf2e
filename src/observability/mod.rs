//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! classifier / emitter / filter loader
//!     → logging.rs (one structured line per classified request, delivery
//!       failures, reloads)
//!     → metrics.rs (requests, matches by source, event outcomes, reloads,
//!       active filter count)
//!
//! Output:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint
//! ```
//!
//! Recording a metric before the exporter is installed is a no-op.

pub mod logging;
pub mod metrics;
