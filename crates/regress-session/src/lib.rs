//! Session client for the conversational engine under regression test.
//!
//! [`SessionClient`] owns one endpoint. It injects configured default
//! parameters, issues a GET (no parameters) or a form-encoded POST, and hands
//! the XML body to [`regress_core::parse_response`]. Sessions are threaded
//! explicitly through [`Session`] values.

/// Engine HTTP client.
pub mod client;
/// Per-deployment client behaviour.
pub mod config;
/// Form parameters.
pub mod params;
/// Response modes and close reports.
pub mod reply;
/// Session value threaded between turns.
pub mod session;

pub use client::SessionClient;
pub use config::{ClientConfig, DISABLE_INTEGRATION_KEY};
pub use params::{RequestParams, CHANNEL, ENTRY, IDENT, SESSION_CLOSED};
pub use reply::{CloseOutcome, CloseReport, RawResponse, Reply, ResponseMode};
pub use session::Session;
