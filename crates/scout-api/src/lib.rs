//! # scout-api
//!
//! HTTP composition layer for scout, the scheduled research fan-out
//! service.
//!
//! This crate wires the domain layer (`scout-core`) to the outside world:
//!
//! - **Dispatcher**: submits every registered task to the external
//!   task-execution API, on a daily schedule or an authenticated manual
//!   trigger
//! - **Webhook endpoint**: verifies signed status callbacks, correlates
//!   them back to tasks, and persists results
//! - **Pages**: server-rendered HTML listing and detail views over the
//!   result store
//!
//! ## Design Principles
//!
//! This crate is a **thin composition layer**: signature verification,
//! callback routing, and storage semantics live in `scout-core`.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /health      - Health check
//! GET  /run?key=..  - Manual dispatch trigger (shared-secret guarded)
//! POST /webhook     - Signed run-status callbacks
//! GET  /            - Listing page
//! GET  /{slug}      - Task detail page
//! GET  /tasks.json  - Registry export
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod schedule;
pub mod server;
pub mod upstream;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::server::Server;
}
