//! Handlers for `/event` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/event` | Paged list |
//! | `POST`   | `/event` | Body: [`NewEvent`]; returns 201 + `{event, alerts}` |
//! | `GET`    | `/event/:id` | Single event |
//! | `DELETE` | `/event/:id` | Alerts referencing the event are kept |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use tripwire_core::{
  alert::Alert,
  event::{Event, NewEvent},
  external::{JobSubmitter, ServiceRegistry},
  index::DocumentIndex,
};
use tripwire_engine::Workflow;
use uuid::Uuid;

use crate::{ApiError, Deleted, Page, PageParams};

/// Response to `POST /event`: the stored event plus every alert its single
/// matching pass produced.
#[derive(Debug, Serialize)]
pub struct EventPosted {
  pub event:  Event,
  pub alerts: Vec<Alert>,
}

/// `GET /event?perPage=...&page=...`
pub async fn list<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<Event>>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let (items, total) = workflow.events.list(&params.into()).await?;
  Ok(Json(Page { items, total }))
}

/// `POST /event` — returns 201 + [`EventPosted`].
pub async fn create<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let (event, alerts) = workflow.events.post(body).await?;
  Ok((StatusCode::CREATED, Json(EventPosted { event, alerts })))
}

/// `GET /event/:id`
pub async fn get_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  Ok(Json(workflow.events.get(id).await?))
}

/// `DELETE /event/:id`
pub async fn delete_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let found = workflow.events.delete(id).await?;
  Ok(Json(Deleted { found }))
}
