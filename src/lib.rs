//! Alert task lifecycle manager.
//!
//! Keeps per-application alert tasks registered with a streaming rule engine
//! and mirrors their configuration in a relational catalog. Four alert kinds
//! are supported: rate anomalies (5xx), crash events, memory usage and
//! release events.

pub mod api;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod kinds;
pub mod lifecycle;
pub mod reconcile;
pub mod template;
pub mod utils;
pub mod vars;

pub use error::{AlertError, Result};
