//! ohms-client: talking to the homework server.
//!
//! Implements `HomeworkApi` over HTTP, loads client configuration, and
//! provides an in-memory backend for tests and offline runs.

pub mod config;
mod error;
pub mod http;
pub mod mock;

pub use config::{create_client, load_config, load_config_from, OhmsConfig};
pub use http::HomeworkClient;
pub use mock::MockBackend;
