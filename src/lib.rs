//! # Deep-Research Relay
//!
//! A self-hosted relay in front of a hosted deep-research API.
//!
//! This library provides:
//! - An HTTP API that proxies task creation, status polling, cancellation,
//!   structured briefs and PDF export for its own browser client
//! - A polling lifecycle manager that drives a remote task to a terminal
//!   state without ever leaking periodic work
//! - An OAuth2 Authorization Code + PKCE flow whose confidential token
//!   exchange runs server-side only
//!
//! ## Task Flow
//! 1. Client submits a research request via the relay
//! 2. Relay creates the remote task and returns the id immediately
//! 3. Client (or the relay's SSE stream) polls status snapshots
//! 4. A terminal status ends polling; the report can be exported as PDF
//!
//! ## Modules
//! - `api`: axum routes and server bootstrap
//! - `research`: task model, upstream clients, polling lifecycle
//! - `auth`: PKCE primitives, session state machine, OAuth client
//! - `pdf`: markdown to printable PDF via headless Chromium

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod pdf;
pub mod research;

pub use config::Config;
pub use error::RelayError;
