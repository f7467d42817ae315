use generational_arena::Index;
use std::sync::Arc;
use std::time::Duration;

/// Where an entry sits in the active policy's auxiliary structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
  /// Not tracked (policy `None`, or between removal and drop).
  Detached,
  /// A node handle in the recency list.
  Node(Index),
  /// A position in the priority queue's backing vector.
  Heap(usize),
}

/// A container for a value in the cache, holding all necessary metadata.
///
/// All timestamps are nanoseconds on the cache's clock.
#[derive(Debug)]
pub(crate) struct CacheEntry<K, V> {
  pub(crate) key: K,
  /// The user's value, wrapped in an Arc for shared ownership.
  pub(crate) value: Arc<V>,
  pub(crate) inserted_at: u64,
  pub(crate) last_accessed: u64,
  /// Starts at 1 on creation, bumped on every hit and every update.
  pub(crate) frequency: u64,
  pub(crate) expires_at: Option<u64>,
  /// Store-wide stamp refreshed on every touch. Unique per live entry, so it
  /// breaks any tie left by equal clock readings.
  pub(crate) sequence: u64,
  pub(crate) link: Link,
}

impl<K, V> CacheEntry<K, V> {
  pub(crate) fn new(
    key: K,
    value: Arc<V>,
    now: u64,
    expires_at: Option<u64>,
    sequence: u64,
  ) -> Self {
    Self {
      key,
      value,
      inserted_at: now,
      last_accessed: now,
      frequency: 1,
      expires_at,
      sequence,
      link: Link::Detached,
    }
  }

  #[inline]
  pub(crate) fn is_expired(&self, now: u64) -> bool {
    matches!(self.expires_at, Some(expires_at) if now > expires_at)
  }

  /// Records a successful read.
  #[inline]
  pub(crate) fn touch(&mut self, now: u64, sequence: u64) {
    self.last_accessed = now;
    self.frequency = self.frequency.saturating_add(1);
    self.sequence = sequence;
  }

  /// Replaces the value of a live entry and refreshes its bookkeeping.
  pub(crate) fn replace(&mut self, value: Arc<V>, now: u64, expires_at: Option<u64>, sequence: u64) {
    self.value = value;
    self.expires_at = expires_at;
    self.touch(now, sequence);
  }

  pub(crate) fn metadata(&self) -> EntryMetadata {
    EntryMetadata {
      frequency: self.frequency,
      inserted_at: Duration::from_nanos(self.inserted_at),
      last_accessed: Duration::from_nanos(self.last_accessed),
      expires_at: self.expires_at.map(Duration::from_nanos),
    }
  }
}

/// A read-only view of an entry's bookkeeping, as seen by the eviction engine.
///
/// Times are readings of the cache's [`Clock`](crate::Clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
  pub frequency: u64,
  pub inserted_at: Duration,
  pub last_accessed: Duration,
  /// `None` when the entry never expires.
  pub expires_at: Option<Duration>,
}
