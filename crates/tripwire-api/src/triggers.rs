//! Handlers for `/trigger` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/trigger` | Paged list |
//! | `POST`   | `/trigger` | Body: [`NewTrigger`]; returns 201 + stored trigger |
//! | `GET`    | `/trigger/:id` | Single trigger |
//! | `PUT`    | `/trigger/:id` | Body: `{"enabled": bool}`; the only mutation |
//! | `DELETE` | `/trigger/:id` | Also removes the registered condition |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use tripwire_core::{
  external::{JobSubmitter, ServiceRegistry},
  index::DocumentIndex,
  trigger::{NewTrigger, Trigger, TriggerUpdate},
};
use tripwire_engine::Workflow;
use uuid::Uuid;

use crate::{ApiError, Deleted, Page, PageParams};

/// `GET /trigger?perPage=...&page=...`
pub async fn list<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<Trigger>>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let (items, total) = workflow.triggers.list(&params.into()).await?;
  Ok(Json(Page { items, total }))
}

/// `POST /trigger` — returns 201 + the stored [`Trigger`], including its
/// store-assigned `percolationId`.
pub async fn create<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Json(body): Json<NewTrigger>,
) -> Result<impl IntoResponse, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let trigger = workflow.triggers.create(body).await?;
  Ok((StatusCode::CREATED, Json(trigger)))
}

/// `GET /trigger/:id`
pub async fn get_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Trigger>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  Ok(Json(workflow.triggers.get(id).await?))
}

/// `PUT /trigger/:id` — body: `{"enabled": bool}`.
pub async fn update_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TriggerUpdate>,
) -> Result<Json<Trigger>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  Ok(Json(workflow.triggers.update(id, body).await?))
}

/// `DELETE /trigger/:id`
pub async fn delete_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let found = workflow.triggers.delete(id).await?;
  Ok(Json(Deleted { found }))
}
