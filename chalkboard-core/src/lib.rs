//! # chalkboard-core
//!
//! Core library for chalkboard - a terminal client for the
//! whiteboard-teaching API.
//!
//! This library provides:
//! - Domain types for sessions, explanations, and animations
//! - A typed HTTP client for the backend REST API
//! - The session aggregator that keeps a client-side view converged with
//!   the backend's asynchronous generation pipeline
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! The backend generates content in stages: a submitted question becomes
//! an `Explanation` (text, generated asynchronously), and each explanation
//! may grow `Animation`s (rendered video, also asynchronous). The client
//! observes progress purely by polling; the aggregator turns that polling
//! into a sequence of atomic, internally-consistent snapshots.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chalkboard_core::{ApiClient, Config, SessionAggregator};
//!
//! # async fn run() -> chalkboard_core::Result<()> {
//! let config = Config::load()?;
//! let client = Arc::new(ApiClient::new(&config.api)?);
//!
//! let aggregator = SessionAggregator::new(client, config.poll.interval());
//! let subscription = aggregator.subscribe("abc123");
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use aggregator::{
    fetch_snapshot, SessionAggregator, SessionHandle, SessionSnapshot, SessionState, Subscription,
};
pub use api::{ApiClient, Backend};
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;
