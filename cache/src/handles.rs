mod sync;

use crate::shared::CacheShared;

use std::fmt;
use std::sync::Arc;

/// A thread-safe, synchronous cache.
///
/// `Cache` is a handle: clones are cheap and share the same entries, so one
/// cache can be handed to any number of threads.
pub struct Cache<K, V, H = ahash::RandomState> {
  pub(crate) shared: Arc<CacheShared<K, V, H>>,
}

impl<K, V, H> Clone for Cache<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<K, V, H> fmt::Debug for Cache<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache")
      .field("shared", &self.shared)
      .finish()
  }
}
