//! # scout-core
//!
//! Domain layer for scout, a scheduled research fan-out service.
//!
//! This crate holds everything that does not depend on the HTTP surface:
//!
//! - **Task registry**: the immutable set of recurring research queries
//! - **Webhook verification**: signed-delivery authentication for callbacks
//! - **Callback routing**: correlating run notifications back to tasks
//! - **Result store**: the durable latest-result-per-task key-value store
//!
//! ## Design Principles
//!
//! The registry is loaded once at startup and never mutated. Correlation
//! between a dispatched run and its later webhook is stateless: the task
//! slug rides along in run metadata and is echoed back by the execution
//! API, so no in-flight table is kept. Results are overwritten per slug,
//! last write wins.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod callback;
pub mod error;
pub mod event;
pub mod observability;
pub mod registry;
pub mod result;
pub mod signature;
pub mod store;

pub use callback::{CallbackOutcome, ResultFetcher};
pub use error::{Error, Result};
pub use event::WebhookEvent;
pub use registry::{TaskDefinition, TaskRegistry};
pub use result::{ResultStatus, StoredResult};
pub use signature::SignatureError;
pub use store::ResultStore;
