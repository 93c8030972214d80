//! In-memory backend for the Tripwire engine.
//!
//! Implements [`tripwire_core::index::DocumentIndex`] with a small
//! reverse-search evaluator, plus test doubles for the service registry and
//! job submitter. Production deployments implement the same traits against a
//! real indexed store; this crate exists for tests and local runs.

mod external;
mod index;
mod percolate;

pub mod error;

pub use error::{Error, Result};
pub use external::{RecordingJobSubmitter, StaticServiceRegistry};
pub use index::MemIndex;
