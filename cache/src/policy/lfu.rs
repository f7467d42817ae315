use super::priority::{PriorityOrder, PriorityTracker};
use crate::entry::CacheEntry;

use std::cmp::Ordering;

/// Orders by access frequency, then by how long ago the entry was touched.
#[derive(Debug)]
pub(crate) struct ByFrequency;

impl PriorityOrder for ByFrequency {
  #[inline]
  fn compare<K, V>(a: &CacheEntry<K, V>, b: &CacheEntry<K, V>) -> Ordering {
    a.frequency
      .cmp(&b.frequency)
      .then_with(|| a.last_accessed.cmp(&b.last_accessed))
      .then_with(|| a.sequence.cmp(&b.sequence))
  }
}

/// An eviction policy that evicts the least frequently used entry, the least
/// recently used one among equals.
pub(crate) type Lfu = PriorityTracker<ByFrequency>;
