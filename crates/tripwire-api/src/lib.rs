//! JSON REST API for Tripwire.
//!
//! Exposes an axum [`Router`] backed by any [`tripwire_engine::Workflow`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tripwire_api::api_router(workflow.clone()))
//! ```

pub mod alerts;
pub mod error;
pub mod event_types;
pub mod events;
pub mod triggers;


use std::sync::Arc;

use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tripwire_core::{
  external::{JobSubmitter, ServiceRegistry},
  index::{DocumentIndex, Pagination},
};
use tripwire_engine::Workflow;

pub use error::ApiError;

// ─── Listener configuration ──────────────────────────────────────────────────

/// Server settings, read from the config file and `TRIPWIRE_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { host: default_host(), port: default_port() }
  }
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  14400
}

// ─── Shared request/response shapes ──────────────────────────────────────────

/// `?perPage=&page=` query parameters accepted by every list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
  pub per_page: Option<usize>,
  pub page:     Option<usize>,
}

impl From<PageParams> for Pagination {
  fn from(params: PageParams) -> Self {
    let defaults = Pagination::default();
    Pagination {
      per_page: params.per_page.unwrap_or(defaults.per_page),
      page:     params.page.unwrap_or(defaults.page),
    }
  }
}

/// One page of a list endpoint, with the total count across all pages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total: u64,
}

/// Body of a `DELETE` response: whether the resource existed.
#[derive(Debug, Serialize)]
pub struct Deleted {
  pub found: bool,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `workflow`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<I, R, J>(workflow: Arc<Workflow<I, R, J>>) -> Router<()>
where
  I: DocumentIndex + 'static,
  R: ServiceRegistry + 'static,
  J: JobSubmitter + 'static,
{
  Router::new()
    // Event types
    .route(
      "/eventType",
      get(event_types::list::<I, R, J>).post(event_types::create::<I, R, J>),
    )
    .route(
      "/eventType/{id}",
      get(event_types::get_one::<I, R, J>)
        .delete(event_types::delete_one::<I, R, J>),
    )
    // Triggers
    .route(
      "/trigger",
      get(triggers::list::<I, R, J>).post(triggers::create::<I, R, J>),
    )
    .route(
      "/trigger/{id}",
      get(triggers::get_one::<I, R, J>)
        .put(triggers::update_one::<I, R, J>)
        .delete(triggers::delete_one::<I, R, J>),
    )
    // Events
    .route(
      "/event",
      get(events::list::<I, R, J>).post(events::create::<I, R, J>),
    )
    .route(
      "/event/{id}",
      get(events::get_one::<I, R, J>).delete(events::delete_one::<I, R, J>),
    )
    // Alerts
    .route("/alert", get(alerts::list::<I, R, J>))
    .route(
      "/alert/{id}",
      get(alerts::get_one::<I, R, J>).delete(alerts::delete_one::<I, R, J>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(workflow)
}
