//! Handlers for `/eventType` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/eventType` | Paged list (`perPage`, `page`) |
//! | `POST`   | `/eventType` | Body: [`NewEventType`]; returns 201 + stored type |
//! | `GET`    | `/eventType/:id` | Single type |
//! | `DELETE` | `/eventType/:id` | 409 if triggers still reference it |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use tripwire_core::{
  event_type::{EventType, NewEventType},
  external::{JobSubmitter, ServiceRegistry},
  index::DocumentIndex,
};
use tripwire_engine::Workflow;
use uuid::Uuid;

use crate::{ApiError, Deleted, Page, PageParams};

/// `GET /eventType?perPage=...&page=...`
pub async fn list<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<EventType>>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let (items, total) = workflow.event_types.list(&params.into()).await?;
  Ok(Json(Page { items, total }))
}

/// `POST /eventType` — returns 201 + the stored [`EventType`].
pub async fn create<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Json(body): Json<NewEventType>,
) -> Result<impl IntoResponse, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let event_type = workflow.event_types.register(body).await?;
  Ok((StatusCode::CREATED, Json(event_type)))
}

/// `GET /eventType/:id`
pub async fn get_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<EventType>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  Ok(Json(workflow.event_types.get(id).await?))
}

/// `DELETE /eventType/:id` — refused with 409 while triggers reference it.
pub async fn delete_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let found = workflow.delete_event_type(id).await?;
  Ok(Json(Deleted { found }))
}
