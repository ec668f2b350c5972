//! Core domain types and utilities for the frontdesk agent.
//!
//! This crate provides the identifiers and error handling shared by the
//! provider, conversation and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{MessageId, ParseIdError, SessionId};
