//! # leno
//!
//! Live log viewer: reads lines from standard input and streams them to any
//! number of browsers as they arrive.
//!
//! ## Features
//!
//! - **Fan-out**: every connected viewer receives every line, in order
//! - **Isolation**: a slow viewer misses lines instead of slowing the rest
//! - **Normalization**: logfmt and nginx access log lines become JSON objects
//! - **Transports**: Server-Sent Events and WebSocket
//!
//! ## Modules
//!
//! - [`hub`]: Broadcast hub with bounded per-viewer queues
//! - [`normalize`]: Structured log line parsers
//! - [`ingest`]: Line source reading standard input
//! - [`server`]: HTTP delivery endpoint with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use leno::hub::BroadcastHub;
//! use leno::ingest;
//! use leno::normalize::{LogFormat, Normalizer};
//! use std::io::Cursor;
//!
//! let hub = BroadcastHub::default();
//! let mut viewer = hub.subscribe();
//! let normalizer = Normalizer::new(LogFormat::Logfmt).unwrap();
//!
//! ingest::run(Cursor::new("level=warn retries=3\nplain text\n"), &normalizer, &hub).unwrap();
//!
//! assert_eq!(viewer.try_recv().unwrap().as_str(), r#"{"level":"warn","retries":3}"#);
//! assert_eq!(viewer.try_recv().unwrap().as_str(), "plain text");
//! ```

pub mod config;
pub mod hub;
pub mod ingest;
pub mod normalize;
pub mod server;

pub use config::Config;
pub use hub::{BroadcastHub, HubConfig, Record, Subscription};
pub use normalize::{LogFormat, Normalizer};
pub use server::{build_router, serve, AppState, ServerError};
