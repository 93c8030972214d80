//! Handlers for `/alert` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/alert` | Paged list; optional `?triggerId=` filter |
//! | `GET`    | `/alert/:id` | Single alert |
//! | `DELETE` | `/alert/:id` | Remove an alert record |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use tripwire_core::{
  alert::Alert,
  external::{JobSubmitter, ServiceRegistry},
  index::DocumentIndex,
};
use tripwire_engine::Workflow;
use uuid::Uuid;

use crate::{ApiError, Deleted, Page, PageParams};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  /// If set, restrict to alerts emitted by this trigger.
  pub trigger_id: Option<Uuid>,
  pub per_page:   Option<usize>,
  pub page:       Option<usize>,
}

/// `GET /alert[?triggerId=...][&perPage=...&page=...]`
pub async fn list<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Alert>>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let page = PageParams { per_page: params.per_page, page: params.page };
  let (items, total) = match params.trigger_id {
    Some(trigger_id) => workflow.alerts.list_by_trigger(trigger_id).await?,
    None => workflow.alerts.list(&page.into()).await?,
  };
  Ok(Json(Page { items, total }))
}

/// `GET /alert/:id`
pub async fn get_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Alert>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  Ok(Json(workflow.alerts.get(id).await?))
}

/// `DELETE /alert/:id`
pub async fn delete_one<I, R, J>(
  State(workflow): State<Arc<Workflow<I, R, J>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, ApiError>
where
  I: DocumentIndex,
  R: ServiceRegistry,
  J: JobSubmitter,
{
  let found = workflow.alerts.delete(id).await?;
  Ok(Json(Deleted { found }))
}
