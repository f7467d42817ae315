use crate::entry::{CacheEntry, EntryMetadata};
use crate::policy::{EvictionPolicy, EvictionTracker};
use crate::time::as_nanos;

use core::fmt;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

use generational_arena::{Arena, Index};

/// The outcome of a bookkeeping read.
#[derive(Debug)]
pub(crate) enum Lookup<K, V> {
  Hit(Arc<V>),
  Miss,
  /// The entry had expired and has been removed. The pair is handed back so
  /// the caller can notify outside the lock.
  Expired(K, Arc<V>),
}

/// What a write did to the store.
#[derive(Debug)]
pub(crate) struct Insertion<K, V> {
  /// The entry evicted to make room, if the store was full.
  pub(crate) evicted: Option<(K, Arc<V>)>,
  /// Whether the key was already present.
  pub(crate) replaced: bool,
}

/// The single-lock core of the cache: the key index, the entry arena and the
/// auxiliary structure of the active policy.
///
/// Callers hold the cache's lock for every call. Eviction and expiration hand
/// removed pairs back instead of notifying, so no user code runs under it.
pub(crate) struct EntryStore<K, V, H> {
  index: HashMap<K, Index, H>,
  entries: Arena<CacheEntry<K, V>>,
  tracker: Box<dyn EvictionTracker<K, V>>,
  policy: EvictionPolicy,
  /// `0` means unbounded.
  capacity: usize,
  default_ttl: Option<Duration>,
  next_sequence: u64,
}

impl<K, V, H> fmt::Debug for EntryStore<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EntryStore")
      .field("policy", &self.policy)
      .field("capacity", &self.capacity)
      .field("len", &self.entries.len())
      .field("default_ttl", &self.default_ttl)
      .finish_non_exhaustive()
  }
}

impl<K, V, H> EntryStore<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  pub(crate) fn new(
    policy: EvictionPolicy,
    capacity: usize,
    default_ttl: Option<Duration>,
    hasher: H,
  ) -> Self {
    Self {
      index: HashMap::with_hasher(hasher),
      entries: Arena::new(),
      tracker: policy.tracker(),
      policy,
      capacity,
      default_ttl: default_ttl.filter(|ttl| !ttl.is_zero()),
      next_sequence: 0,
    }
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.index.len()
  }

  /// Whether inserting a new key must evict first.
  #[inline]
  pub(crate) fn is_full(&self) -> bool {
    self.policy.evicts() && self.capacity > 0 && self.index.len() >= self.capacity
  }

  /// Reads an entry and records the access under the active policy.
  ///
  /// An expired entry is removed and reported instead of returned.
  pub(crate) fn get<Q>(&mut self, key: &Q, now: u64) -> Lookup<K, V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let Some(&slot) = self.index.get(key) else {
      return Lookup::Miss;
    };

    if self.entries[slot].is_expired(now) {
      return match self.remove_slot(slot) {
        Some((key, value)) => Lookup::Expired(key, value),
        None => Lookup::Miss,
      };
    }

    if self.policy.evicts() {
      let sequence = self.next_sequence();
      self.entries[slot].touch(now, sequence);
      self.tracker.on_access(slot, &mut self.entries);
    }
    Lookup::Hit(Arc::clone(&self.entries[slot].value))
  }

  /// The read path for policy `None`: no bookkeeping, no expiry, shared lock.
  pub(crate) fn get_shared<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self
      .index
      .get(key)
      .map(|&slot| Arc::clone(&self.entries[slot].value))
  }

  /// Returns a live entry's value without touching it. Expired entries read
  /// as absent but stay in place until the next `get`.
  pub(crate) fn peek<Q>(&self, key: &Q, now: u64) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.live(key, now).map(|entry| Arc::clone(&entry.value))
  }

  pub(crate) fn metadata<Q>(&self, key: &Q, now: u64) -> Option<EntryMetadata>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.live(key, now).map(CacheEntry::metadata)
  }

  /// Inserts or replaces `key`.
  ///
  /// `ttl` overrides the store's default; a zero duration means no expiry.
  /// A new key evicts exactly one victim first when the store is full.
  pub(crate) fn insert(
    &mut self,
    key: K,
    value: Arc<V>,
    ttl: Option<Duration>,
    now: u64,
  ) -> Insertion<K, V> {
    let expires_at = self.expiry_for(ttl, now);
    let sequence = self.next_sequence();

    if let Some(&slot) = self.index.get(&key) {
      self.entries[slot].replace(value, now, expires_at, sequence);
      self.tracker.on_update(slot, &mut self.entries);
      return Insertion {
        evicted: None,
        replaced: true,
      };
    }

    let evicted = if self.is_full() {
      self.evict_one()
    } else {
      None
    };

    let slot = self.entries.insert(CacheEntry::new(
      key.clone(),
      value,
      now,
      expires_at,
      sequence,
    ));
    self.index.insert(key, slot);
    self.tracker.on_insert(slot, &mut self.entries);

    Insertion {
      evicted,
      replaced: false,
    }
  }

  pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<(K, Arc<V>)>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let slot = *self.index.get(key)?;
    self.remove_slot(slot)
  }

  /// Drops every entry and resets the auxiliary structure.
  pub(crate) fn clear(&mut self) {
    self.index.clear();
    self.entries.clear();
    self.tracker.clear();
  }

  /// Removes the active policy's current victim.
  fn evict_one(&mut self) -> Option<(K, Arc<V>)> {
    let victim = self.tracker.victim()?;
    self.remove_slot(victim)
  }

  fn remove_slot(&mut self, slot: Index) -> Option<(K, Arc<V>)> {
    if !self.entries.contains(slot) {
      return None;
    }
    self.tracker.on_remove(slot, &mut self.entries);
    let entry = self.entries.remove(slot)?;
    self.index.remove(&entry.key);
    Some((entry.key, entry.value))
  }

  fn live<Q>(&self, key: &Q, now: u64) -> Option<&CacheEntry<K, V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let entry = &self.entries[*self.index.get(key)?];
    (!entry.is_expired(now)).then_some(entry)
  }

  fn expiry_for(&self, ttl: Option<Duration>, now: u64) -> Option<u64> {
    if !self.policy.evicts() {
      return None;
    }
    ttl
      .or(self.default_ttl)
      .filter(|ttl| !ttl.is_zero())
      .map(|ttl| now.saturating_add(as_nanos(ttl)))
  }

  /// The key the policy would evict next.
  #[cfg(test)]
  pub(crate) fn victim_key(&self) -> Option<&K> {
    self.tracker.victim().map(|slot| &self.entries[slot].key)
  }

  #[cfg(test)]
  pub(crate) fn iter_entries(&self) -> impl Iterator<Item = &CacheEntry<K, V>> {
    self.entries.iter().map(|(_, entry)| entry)
  }

  #[inline]
  fn next_sequence(&mut self) -> u64 {
    let sequence = self.next_sequence;
    self.next_sequence += 1;
    sequence
  }

  /// Checks that the index, the arena and the auxiliary structure describe
  /// the same set of entries, that every back-reference between entries and
  /// the policy's structure agrees, and that capacity holds.
  #[cfg(test)]
  pub(crate) fn check_invariants(&self) -> Result<(), String> {
    use crate::entry::Link;

    if self.index.len() != self.entries.len() {
      return Err(format!(
        "index has {} keys but arena has {} entries",
        self.index.len(),
        self.entries.len()
      ));
    }

    let tracked = if self.policy.evicts() {
      self.index.len()
    } else {
      0
    };
    if self.tracker.len() != tracked {
      return Err(format!(
        "tracker holds {} handles, expected {}",
        self.tracker.len(),
        tracked
      ));
    }

    for (key, &slot) in &self.index {
      let entry = self
        .entries
        .get(slot)
        .ok_or_else(|| "index points at a freed slot".to_string())?;
      if entry.key != *key {
        return Err("index points at an entry with a different key".to_string());
      }
      let detached = entry.link == Link::Detached;
      if detached == self.policy.evicts() {
        return Err(format!("entry has link {:?} under {}", entry.link, self.policy));
      }
    }
    self.tracker.check(&self.entries)?;

    if self.policy.evicts() && self.capacity > 0 && self.index.len() > self.capacity {
      return Err(format!(
        "{} entries exceed capacity {}",
        self.index.len(),
        self.capacity
      ));
    }
    Ok(())
  }
}
