use crate::builder::CacheBuilder;
use crate::config::CacheConfig;
use crate::entry::EntryMetadata;
use crate::error::{BuildError, LoadError, Result};
use crate::handles::Cache;
use crate::loader::InFlight;
use crate::metrics::Metrics;
use crate::policy::EvictionPolicy;
use crate::shared::CacheShared;
use crate::store::Lookup;
use crate::{EvictionReason, MetricsSnapshot};

use std::borrow::Borrow;
use std::error::Error as StdError;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

impl<K, V> Cache<K, V> {
  /// Creates a cache from a plain configuration.
  ///
  /// Fails if the configured capacity is negative.
  pub fn new(config: CacheConfig) -> Result<Self, BuildError>
  where
    K: Eq + Hash + Clone,
  {
    CacheBuilder::from_config(&config)?.build()
  }

  /// Returns a builder with default settings.
  pub fn builder() -> CacheBuilder<K, V> {
    CacheBuilder::new()
  }
}

impl<K, V, H> Cache<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  /// Retrieves a value from the cache, recording the access.
  ///
  /// Returns `None` when the key is absent or its entry has expired. An
  /// expired entry is removed on the spot and reported to the listener as
  /// [`EvictionReason::Expired`].
  pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    match self.lookup(key) {
      Lookup::Hit(value) => {
        Metrics::record(&self.shared.metrics.hits);
        Some(value)
      }
      Lookup::Miss => {
        Metrics::record(&self.shared.metrics.misses);
        None
      }
      Lookup::Expired(key, value) => {
        Metrics::record(&self.shared.metrics.misses);
        self.expired(key, value);
        None
      }
    }
  }

  /// "Peeks" at a value in the cache without updating its recency,
  /// frequency or the hit/miss counters.
  ///
  /// An expired entry reads as absent but is left for the next `get`.
  pub fn peek<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    if !self.shared.policy.evicts() {
      return self.shared.store.read().get_shared(key);
    }
    let now = self.shared.now();
    self.shared.store.read().peek(key, now)
  }

  /// Returns `true` if the cache holds a live entry for `key`. Same semantics
  /// as `peek`.
  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.peek(key).is_some()
  }

  /// Returns the eviction bookkeeping of a live entry without touching it.
  pub fn metadata<Q>(&self, key: &Q) -> Option<EntryMetadata>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let now = self.shared.now();
    self.shared.store.read().metadata(key, now)
  }

  /// Inserts a key-value pair into the cache, replacing any existing value.
  ///
  /// The entry expires after the cache's default TTL, if one is set.
  pub fn set(&self, key: K, value: V) {
    self.insert(key, Arc::new(value), None);
  }

  /// Inserts a key-value pair that expires after `ttl` instead of the default
  /// TTL. A zero `ttl` means the entry never expires. Ignored under
  /// [`EvictionPolicy::None`].
  pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
    self.insert(key, Arc::new(value), Some(ttl));
  }

  /// Removes an entry from the cache, returning `true` if the key was found.
  pub fn delete<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let removed = self.shared.store.write().remove(key);
    match removed {
      Some((key, value)) => {
        Metrics::record(&self.shared.metrics.invalidations);
        self
          .shared
          .notify(key, value, EvictionReason::Invalidated);
        true
      }
      None => false,
    }
  }

  /// The number of entries, including expired ones not yet read.
  pub fn len(&self) -> usize {
    self.shared.store.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Removes all entries from the cache. The listener is not notified.
  pub fn clear(&self) {
    self.shared.store.write().clear();
  }

  /// The configured maximum number of entries. `0` means unbounded.
  pub fn capacity(&self) -> usize {
    self.shared.capacity
  }

  pub fn policy(&self) -> EvictionPolicy {
    self.shared.policy
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  /// Returns the cached value for `key`, or runs `loader` to produce it.
  ///
  /// Concurrent calls for the same key share a single load: one caller runs
  /// `loader` while the others block until it finishes and then receive the
  /// same value or the same error. A successful value is stored with normal
  /// `set` semantics before anyone receives it. A failed load caches nothing,
  /// so the next call retries.
  ///
  /// `loader` runs on the calling thread with no cache lock held, so it may
  /// use the cache itself, but not for the key being loaded. A capacity
  /// eviction caused by storing the result is reported after waiters are
  /// released.
  pub fn get_or_set<F, E>(&self, key: K, loader: F) -> Result<Arc<V>>
  where
    F: FnOnce() -> std::result::Result<V, E>,
    E: Into<Box<dyn StdError + Send + Sync>>,
  {
    if let Some(value) = self.get(&key) {
      return Ok(value);
    }

    let mut expired = None;
    let role = {
      let mut pending = self.shared.pending_loads.lock();
      match pending.get(&key) {
        Some(flight) => Role::Wait(Arc::clone(flight)),
        // A load may have finished between our miss and taking the lock.
        None => match self.lookup(&key) {
          Lookup::Hit(value) => Role::Done(value),
          lookup => {
            if let Lookup::Expired(stale_key, stale_value) = lookup {
              expired = Some((stale_key, stale_value));
            }
            let flight = Arc::new(InFlight::new());
            pending.insert(key.clone(), Arc::clone(&flight));
            Role::Lead(flight)
          }
        },
      }
    };

    if let Some((key, value)) = expired {
      self.expired(key, value);
    }

    match role {
      Role::Done(value) => Ok(value),
      Role::Wait(flight) => {
        Metrics::record(&self.shared.metrics.coalesced_loads);
        tracing::trace!("joining an in-flight load");
        flight.wait()
      }
      Role::Lead(flight) => self.lead(key, flight, loader),
    }
  }

  /// Runs the loader as the single leader for `key` and publishes the result.
  fn lead<F, E>(&self, key: K, flight: Arc<InFlight<V>>, loader: F) -> Result<Arc<V>>
  where
    F: FnOnce() -> std::result::Result<V, E>,
    E: Into<Box<dyn StdError + Send + Sync>>,
  {
    let guard = FlightGuard {
      shared: &self.shared,
      key: &key,
      flight,
      finished: false,
    };

    Metrics::record(&self.shared.metrics.loads);
    match loader() {
      Ok(value) => {
        let value = Arc::new(value);
        let evicted = self.write_entry(key.clone(), Arc::clone(&value), None);
        let result = guard.finish(Ok(value));
        // The load is retired before the listener hears about its eviction.
        if let Some((key, value)) = evicted {
          self.shared.notify(key, value, EvictionReason::Capacity);
        }
        result
      }
      Err(err) => {
        let err = LoadError::failed(err);
        Metrics::record(&self.shared.metrics.load_failures);
        tracing::debug!(error = %err, "loader failed; nothing was cached");
        guard.finish(Err(err))
      }
    }
  }

  /// Takes the store lock in the mode the policy needs.
  fn lookup<Q>(&self, key: &Q) -> Lookup<K, V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    if !self.shared.policy.evicts() {
      return match self.shared.store.read().get_shared(key) {
        Some(value) => Lookup::Hit(value),
        None => Lookup::Miss,
      };
    }
    let now = self.shared.now();
    self.shared.store.write().get(key, now)
  }

  fn insert(&self, key: K, value: Arc<V>, ttl: Option<Duration>) {
    if let Some((key, value)) = self.write_entry(key, value, ttl) {
      self.shared.notify(key, value, EvictionReason::Capacity);
    }
  }

  /// Stores the pair and returns the entry evicted to make room, if any.
  fn write_entry(&self, key: K, value: Arc<V>, ttl: Option<Duration>) -> Option<(K, Arc<V>)> {
    let now = self.shared.now();
    let insertion = self.shared.store.write().insert(key, value, ttl, now);

    if insertion.replaced {
      Metrics::record(&self.shared.metrics.updates);
    } else {
      Metrics::record(&self.shared.metrics.inserts);
    }

    if insertion.evicted.is_some() {
      Metrics::record(&self.shared.metrics.evicted_by_capacity);
      tracing::debug!(
        policy = %self.shared.policy,
        capacity = self.shared.capacity,
        "evicted an entry to stay within capacity"
      );
    }
    insertion.evicted
  }

  fn expired(&self, key: K, value: Arc<V>) {
    Metrics::record(&self.shared.metrics.evicted_by_ttl);
    tracing::trace!("removed an expired entry on read");
    self.shared.notify(key, value, EvictionReason::Expired);
  }
}

/// What a `get_or_set` caller does once it has checked the registry.
enum Role<V> {
  Done(Arc<V>),
  Wait(Arc<InFlight<V>>),
  Lead(Arc<InFlight<V>>),
}

/// Retires the leader's registry record and completes its waiters.
///
/// If the loader unwinds, `Drop` completes the waiters with
/// [`LoadError::Abandoned`] so none of them blocks forever.
struct FlightGuard<'a, K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  shared: &'a CacheShared<K, V, H>,
  key: &'a K,
  flight: Arc<InFlight<V>>,
  finished: bool,
}

impl<K, V, H> FlightGuard<'_, K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  fn finish(mut self, result: Result<Arc<V>>) -> Result<Arc<V>> {
    self.finished = true;
    self.retire(result.clone());
    result
  }

  fn retire(&self, result: Result<Arc<V>>) {
    self.shared.pending_loads.lock().remove(self.key);
    self.flight.complete(result);
  }
}

impl<K, V, H> Drop for FlightGuard<'_, K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  fn drop(&mut self) {
    if !self.finished {
      Metrics::record(&self.shared.metrics.load_failures);
      tracing::debug!("loader panicked; waiters are released with an error");
      self.retire(Err(LoadError::Abandoned));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::time::ManualClock;

  fn manual_cache(policy: EvictionPolicy, capacity: usize) -> (Cache<String, i32>, ManualClock) {
    let clock = ManualClock::new();
    let cache = Cache::builder()
      .policy(policy)
      .capacity(capacity)
      .clock(clock.clone())
      .build()
      .unwrap();
    (cache, clock)
  }

  #[test]
  fn get_counts_hits_and_misses() {
    let (cache, _clock) = manual_cache(EvictionPolicy::Lru, 0);
    cache.set("a".to_string(), 1);

    assert_eq!(cache.get("a").map(|v| *v), Some(1));
    assert!(cache.get("b").is_none());

    let metrics = cache.metrics();
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.misses, 1);
    assert_eq!(metrics.inserts, 1);
  }

  #[test]
  fn peek_does_not_protect_from_eviction() {
    let (cache, _clock) = manual_cache(EvictionPolicy::Lru, 2);
    cache.set("a".to_string(), 1);
    cache.set("b".to_string(), 2);
    assert!(cache.peek("a").is_some());
    cache.set("c".to_string(), 3);

    assert!(!cache.contains_key("a"));
    assert!(cache.contains_key("b"));
    assert_eq!(cache.metrics().hits, 0);
  }

  #[test]
  fn set_with_ttl_expires_on_the_clock() {
    let (cache, clock) = manual_cache(EvictionPolicy::Lru, 0);
    cache.set_with_ttl("a".to_string(), 1, Duration::from_millis(50));

    clock.advance(Duration::from_millis(50));
    assert!(cache.get("a").is_some());
    clock.advance(Duration::from_nanos(1));
    assert!(cache.get("a").is_none());
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.metrics().evicted_by_ttl, 1);
  }

  #[test]
  fn get_or_set_recheck_uses_value_loaded_meanwhile() {
    let (cache, _clock) = manual_cache(EvictionPolicy::Lru, 0);
    let value = cache
      .get_or_set("a".to_string(), || {
        // Inner writes to other keys are fine while loading.
        cache.set("b".to_string(), 2);
        Ok::<_, std::io::Error>(1)
      })
      .unwrap();

    assert_eq!(*value, 1);
    assert_eq!(cache.get("b").map(|v| *v), Some(2));
    assert!(cache.shared.pending_loads.lock().is_empty());
  }

  #[test]
  fn guard_drop_releases_abandoned_load() {
    let (cache, _clock) = manual_cache(EvictionPolicy::Lru, 0);
    let key = "a".to_string();
    let flight = Arc::new(InFlight::new());
    cache
      .shared
      .pending_loads
      .lock()
      .insert(key.clone(), Arc::clone(&flight));

    drop(FlightGuard {
      shared: &cache.shared,
      key: &key,
      flight: Arc::clone(&flight),
      finished: false,
    });

    assert!(matches!(flight.wait(), Err(LoadError::Abandoned)));
    assert!(cache.shared.pending_loads.lock().is_empty());
    assert_eq!(cache.metrics().load_failures, 1);
  }
}
