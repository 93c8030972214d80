//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tripwire_engine::Error as EngineError;

/// An error returned by an API handler. Thin wrapper over the engine error;
/// the status mapping lives in one place.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub EngineError);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use tripwire_core::Error as CoreError;

    let status = match &self.0 {
      EngineError::EventTypeNotFound(_)
      | EngineError::TriggerNotFound(_)
      | EngineError::EventNotFound(_)
      | EngineError::AlertNotFound(_) => StatusCode::NOT_FOUND,

      EngineError::DuplicateName(_) | EngineError::HasDependents(_, _) => {
        StatusCode::CONFLICT
      }

      EngineError::UnknownEventType(_)
      | EngineError::UnknownService(_)
      | EngineError::Core(
        CoreError::InvalidMapping(_)
        | CoreError::InvalidEventData(_)
        | CoreError::MissingServiceId,
      ) => StatusCode::BAD_REQUEST,

      EngineError::Upstream { .. } => StatusCode::BAD_GATEWAY,

      EngineError::Core(CoreError::Serialization(_))
      | EngineError::Serialization(_)
      | EngineError::InconsistentState(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": self.0.to_string() }))).into_response()
  }
}
