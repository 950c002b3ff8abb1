//! HTTP API exposed by the relay, consumed by its own browser client.

pub mod auth;
pub mod pdf;
pub mod research;
pub mod routes;
pub mod types;

pub use routes::{serve, AppState};
