use crate::config::CacheConfig;
use crate::error::BuildError;
use crate::handles::Cache;
use crate::metrics::Metrics;
use crate::policy::EvictionPolicy;
use crate::shared::CacheShared;
use crate::store::EntryStore;
use crate::time::{Clock, SystemClock};
use crate::EvictionListener;

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

/// A builder for creating `Cache` instances.
pub struct CacheBuilder<K, V, H = ahash::RandomState> {
  pub(crate) capacity: usize,
  pub(crate) policy: EvictionPolicy,
  pub(crate) default_ttl: Option<Duration>,
  pub(crate) hasher: H,
  clock: Option<Arc<dyn Clock>>,
  listener: Option<Arc<dyn EvictionListener<K, V>>>,
}

// Manual Debug implementation for CacheBuilder.
impl<K, V, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("capacity", &self.capacity)
      .field("policy", &self.policy)
      .field("default_ttl", &self.default_ttl)
      .field("has_clock", &self.clock.is_some())
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

// --- Default Constructor ---
impl<K, V> CacheBuilder<K, V> {
  /// Creates a new `CacheBuilder` with default settings: unbounded, LRU, no
  /// expiration.
  pub fn new() -> Self {
    Self {
      capacity: 0,
      policy: EvictionPolicy::default(),
      default_ttl: None,
      hasher: ahash::RandomState::new(),
      clock: None,
      listener: None,
    }
  }

  /// Creates a builder preloaded from `config`, rejecting invalid values.
  pub fn from_config(config: &CacheConfig) -> Result<Self, BuildError> {
    let capacity = config.validate()?;
    let mut builder = Self::new().capacity(capacity).policy(config.policy);
    if let Some(ttl) = config.default_ttl {
      builder = builder.default_ttl(ttl);
    }
    Ok(builder)
  }
}

impl<K, V> Default for CacheBuilder<K, V> {
  fn default() -> Self {
    Self::new()
  }
}

// --- General Configuration Methods ---
impl<K, V, H> CacheBuilder<K, V, H> {
  /// Sets the maximum number of entries. `0` means unbounded.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Sets the cache to be "unbounded".
  pub fn unbounded(mut self) -> Self {
    self.capacity = 0;
    self
  }

  /// Sets the eviction policy. Defaults to LRU.
  pub fn policy(mut self, policy: EvictionPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Sets a time-to-live applied to every entry written without its own.
  /// A zero duration disables expiration.
  pub fn default_ttl(mut self, duration: Duration) -> Self {
    self.default_ttl = Some(duration).filter(|ttl| !ttl.is_zero());
    self
  }

  /// Sets the time source used for expiration and access bookkeeping.
  ///
  /// Defaults to [`SystemClock`]. Tests typically pass a
  /// [`ManualClock`](crate::ManualClock).
  pub fn clock<C>(mut self, clock: C) -> Self
  where
    C: Clock + 'static,
  {
    self.clock = Some(Arc::new(clock));
    self
  }

  /// Sets the eviction listener for the cache.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<K, V> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Sets the hasher for the cache's key index.
  pub fn hasher<H2>(self, hasher: H2) -> CacheBuilder<K, V, H2> {
    CacheBuilder {
      capacity: self.capacity,
      policy: self.policy,
      default_ttl: self.default_ttl,
      hasher,
      clock: self.clock,
      listener: self.listener,
    }
  }
}

// --- Build Methods ---
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher + Clone,
{
  /// Builds a `Cache`.
  pub fn build(self) -> Result<Cache<K, V, H>, BuildError> {
    if !self.policy.evicts() && self.default_ttl.is_some() {
      tracing::warn!(
        default_ttl = ?self.default_ttl,
        "policy 'none' never expires entries; the default TTL is ignored"
      );
    }

    let store = EntryStore::new(
      self.policy,
      self.capacity,
      self.default_ttl,
      self.hasher.clone(),
    );

    let shared = CacheShared {
      store: RwLock::new(store),
      pending_loads: Mutex::new(HashMap::with_hasher(self.hasher)),
      listener: self.listener,
      metrics: Metrics::new(),
      clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
      policy: self.policy,
      capacity: self.capacity,
    };

    Ok(Cache {
      shared: Arc::new(shared),
    })
  }
}
