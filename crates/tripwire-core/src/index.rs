//! The `DocumentIndex` trait — the boundary to the external indexed store.
//!
//! The store provides per-kind document CRUD, a paginated scan, and the
//! reverse-search (percolation) primitive: queries are registered up front
//! and, for each newly posted document, the set of registered queries it
//! satisfies is returned with the write result.
//!
//! All coordination is delegated to the store's per-document atomicity.
//! The engine holds no cache and takes no locks; every read re-fetches.

use std::future::Future;

use serde_json::Value;
use uuid::Uuid;

// ─── Result types ────────────────────────────────────────────────────────────

/// Outcome of posting a document.
#[derive(Debug, Clone, Default)]
pub struct PostOutcome {
  pub created:         bool,
  /// Identifiers of the registered reverse-search queries the new document
  /// matched. Computed by the store as part of the write, not locally.
  pub matched_queries: Vec<Uuid>,
}

/// Paging parameters for [`DocumentIndex::scan`].
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
  pub per_page: usize,
  pub page:     usize,
}

impl Default for Pagination {
  fn default() -> Self {
    Self { per_page: 100, page: 0 }
  }
}

/// One page of a scan, with the total count across all pages.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
  pub hits:  Vec<Value>,
  pub total: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the external indexed document store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes. Every call is blocking I/O from the
/// caller's perspective; timeouts and retries are the store's contract,
/// not the engine's.
pub trait DocumentIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether any document of `kind` has ever been written.
  fn exists<'a>(
    &'a self,
    kind: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Write a document and evaluate it against all registered reverse-search
  /// queries.
  fn post<'a>(
    &'a self,
    kind: &'a str,
    id: Uuid,
    doc: Value,
  ) -> impl Future<Output = Result<PostOutcome, Self::Error>> + Send + 'a;

  /// Overwrite an existing document. Last-write-wins per id; no
  /// compare-and-swap is used in this design.
  fn put<'a>(
    &'a self,
    kind: &'a str,
    id: Uuid,
    doc: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Fetch a document by id. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    kind: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Delete a document by id. Returns whether it was found.
  fn delete<'a>(
    &'a self,
    kind: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Paginated scan over all documents of `kind`.
  fn scan<'a>(
    &'a self,
    kind: &'a str,
    page: &'a Pagination,
  ) -> impl Future<Output = Result<ScanPage, Self::Error>> + Send + 'a;

  /// Register `body` as a reverse-search query under `id`, returning the
  /// store-assigned query identifier.
  fn register_reverse_query(
    &self,
    id: Uuid,
    body: Value,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  /// Remove a registered reverse-search query. Returns whether it was found.
  fn deregister_reverse_query(
    &self,
    query_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
