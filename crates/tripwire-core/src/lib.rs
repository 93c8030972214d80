//! Core types and trait definitions for the Tripwire event-condition-action
//! engine.
//!
//! This crate is deliberately free of HTTP and storage dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod alert;
pub mod error;
pub mod event;
pub mod event_type;
pub mod external;
pub mod index;
pub mod query;
pub mod trigger;

pub use error::{Error, Result};
