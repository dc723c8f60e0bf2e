//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connection info)
//!     → request.rs (request ID, RequestContext extraction)
//!     → middleware.rs (classify, queue event, cache bypass on match)
//!     → server.rs proxy_handler (forward to upstream)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
