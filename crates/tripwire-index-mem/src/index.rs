//! [`MemIndex`] — the in-memory implementation of [`DocumentIndex`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use tripwire_core::index::{DocumentIndex, Pagination, PostOutcome, ScanPage};

use crate::{Error, Result, percolate};

/// An in-memory document store with reverse-search.
///
/// Cloning is cheap — all clones share the same state. Per-call atomicity
/// comes from the single `RwLock`, matching the per-document atomicity the
/// engine assumes of the real store.
#[derive(Clone, Default)]
pub struct MemIndex {
  state: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
  kinds:          HashMap<String, BTreeMap<Uuid, Value>>,
  queries:        BTreeMap<Uuid, Value>,
  fail_next_post: Option<String>,
}

impl MemIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make the next `post` to `kind` fail before any write happens.
  /// Used to exercise the engine's compensation paths.
  pub async fn fail_next_post(&self, kind: &str) {
    self.state.write().await.fail_next_post = Some(kind.to_string());
  }

  /// How many reverse-search queries are currently registered.
  pub async fn registered_query_count(&self) -> usize {
    self.state.read().await.queries.len()
  }
}

impl DocumentIndex for MemIndex {
  type Error = Error;

  async fn exists(&self, kind: &str) -> Result<bool> {
    let state = self.state.read().await;
    Ok(state.kinds.get(kind).is_some_and(|docs| !docs.is_empty()))
  }

  async fn post(&self, kind: &str, id: Uuid, doc: Value) -> Result<PostOutcome> {
    let mut state = self.state.write().await;

    if state.fail_next_post.as_deref() == Some(kind) {
      state.fail_next_post = None;
      return Err(Error::Injected(kind.to_string()));
    }

    if state.kinds.get(kind).is_some_and(|docs| docs.contains_key(&id)) {
      return Err(Error::AlreadyExists(kind.to_string(), id));
    }

    let matched_queries = state
      .queries
      .iter()
      .filter(|(_, body)| percolate::matches(body, &doc))
      .map(|(query_id, _)| *query_id)
      .collect();

    state
      .kinds
      .entry(kind.to_string())
      .or_default()
      .insert(id, doc);

    Ok(PostOutcome { created: true, matched_queries })
  }

  async fn put(&self, kind: &str, id: Uuid, doc: Value) -> Result<()> {
    let mut state = self.state.write().await;
    state.kinds.entry(kind.to_string()).or_default().insert(id, doc);
    Ok(())
  }

  async fn get(&self, kind: &str, id: Uuid) -> Result<Option<Value>> {
    let state = self.state.read().await;
    Ok(state.kinds.get(kind).and_then(|docs| docs.get(&id)).cloned())
  }

  async fn delete(&self, kind: &str, id: Uuid) -> Result<bool> {
    let mut state = self.state.write().await;
    Ok(
      state
        .kinds
        .get_mut(kind)
        .is_some_and(|docs| docs.remove(&id).is_some()),
    )
  }

  async fn scan(&self, kind: &str, page: &Pagination) -> Result<ScanPage> {
    let state = self.state.read().await;
    let Some(docs) = state.kinds.get(kind) else {
      return Ok(ScanPage::default());
    };

    let hits = docs
      .values()
      .skip(page.page * page.per_page)
      .take(page.per_page)
      .cloned()
      .collect();

    Ok(ScanPage { hits, total: docs.len() as u64 })
  }

  async fn register_reverse_query(&self, id: Uuid, body: Value) -> Result<Uuid> {
    percolate::validate(&body)?;
    let mut state = self.state.write().await;
    state.queries.insert(id, body);
    Ok(id)
  }

  async fn deregister_reverse_query(&self, query_id: Uuid) -> Result<bool> {
    let mut state = self.state.write().await;
    Ok(state.queries.remove(&query_id).is_some())
  }
}
