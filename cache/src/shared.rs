use crate::listener::{EvictionListener, EvictionReason};
use crate::loader::InFlight;
use crate::metrics::Metrics;
use crate::policy::EvictionPolicy;
use crate::store::EntryStore;
use crate::time::{as_nanos, Clock};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// The internal, thread-safe core of the cache.
///
/// Lock order is `pending_loads` then `store`. Neither lock is held while
/// the listener or a loader runs.
pub(crate) struct CacheShared<K, V, H> {
  pub(crate) store: RwLock<EntryStore<K, V, H>>,
  pub(crate) pending_loads: Mutex<HashMap<K, Arc<InFlight<V>>, H>>,
  pub(crate) listener: Option<Arc<dyn EvictionListener<K, V>>>,
  pub(crate) metrics: Metrics,
  pub(crate) clock: Arc<dyn Clock>,
  pub(crate) policy: EvictionPolicy,
  pub(crate) capacity: usize,
}

impl<K, V, H> fmt::Debug for CacheShared<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("policy", &self.policy)
      .field("capacity", &self.capacity)
      .field("clock", &self.clock)
      .field("has_listener", &self.listener.is_some())
      .field("metrics", &self.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl<K, V, H> CacheShared<K, V, H> {
  /// The current clock reading in entry timestamp units.
  #[inline]
  pub(crate) fn now(&self) -> u64 {
    as_nanos(self.clock.now())
  }

  /// Hands a removed entry to the listener, if one is registered.
  #[inline]
  pub(crate) fn notify(&self, key: K, value: Arc<V>, reason: EvictionReason) {
    if let Some(listener) = &self.listener {
      listener.on_evict(key, value, reason);
    }
  }
}
