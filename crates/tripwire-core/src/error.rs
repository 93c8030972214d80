//! Error types for `tripwire-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid mapping: {0}")]
  InvalidMapping(String),

  #[error("invalid event data: {0}")]
  InvalidEventData(String),

  #[error("job action has no serviceId field of type string")]
  MissingServiceId,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
