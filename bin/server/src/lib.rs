//! HTTP server for the frontdesk customer-service agent.
//!
//! Exposes the session manager as a small JSON API, plus read-only views
//! of the recorded leads and feedback.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::router;
