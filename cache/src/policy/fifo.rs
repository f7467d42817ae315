use super::recency_list::RecencyList;
use super::EvictionTracker;
use crate::entry::{CacheEntry, Link};

use generational_arena::{Arena, Index};

/// An eviction policy that evicts entries in a First-In, First-Out (FIFO) manner.
#[derive(Debug)]
pub(crate) struct Fifo {
  // Head is the newest entry, tail the oldest.
  list: RecencyList<Index>,
}

impl Fifo {
  pub fn new() -> Self {
    Self {
      list: RecencyList::new(),
    }
  }
}

impl<K, V> EvictionTracker<K, V> for Fifo {
  fn on_insert(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    let node = self.list.push_front(slot);
    entries[slot].link = Link::Node(node);
  }

  /// A FIFO policy does not care about access patterns. This is a no-op.
  fn on_access(&mut self, _slot: Index, _entries: &mut Arena<CacheEntry<K, V>>) {}

  /// Overwriting a key keeps its original insertion position.
  fn on_update(&mut self, _slot: Index, _entries: &mut Arena<CacheEntry<K, V>>) {}

  fn on_remove(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    if let Link::Node(node) = entries[slot].link {
      self.list.remove(node);
      entries[slot].link = Link::Detached;
    }
  }

  fn victim(&self) -> Option<Index> {
    self.list.back()
  }

  fn clear(&mut self) {
    self.list.clear();
  }

  fn len(&self) -> usize {
    self.list.len()
  }

  #[cfg(test)]
  fn check(&self, entries: &Arena<CacheEntry<K, V>>) -> Result<(), String> {
    super::check_list_links(&self.list, entries)
  }
}
