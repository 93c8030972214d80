//! Error type for `tripwire-index-mem`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The reverse-search query body uses a clause the evaluator does not
  /// understand. Raised at registration time, mirroring the real store's
  /// parse failure.
  #[error("failed to parse reverse-search query: {0}")]
  UnsupportedQuery(String),

  #[error("document {1} of kind {0:?} already exists")]
  AlreadyExists(String, uuid::Uuid),

  /// A failure scheduled with [`MemIndex::fail_next_post`].
  ///
  /// [`MemIndex::fail_next_post`]: crate::MemIndex::fail_next_post
  #[error("injected failure: post to {0:?}")]
  Injected(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
