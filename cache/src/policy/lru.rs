use super::recency_list::RecencyList;
use super::EvictionTracker;
use crate::entry::{CacheEntry, Link};

use generational_arena::{Arena, Index};

/// An eviction policy that evicts the least recently used entries.
#[derive(Debug)]
pub(crate) struct Lru {
  // Head is the most recently used entry.
  list: RecencyList<Index>,
}

impl Lru {
  pub fn new() -> Self {
    Self {
      list: RecencyList::new(),
    }
  }
}

impl<K, V> EvictionTracker<K, V> for Lru {
  /// A new entry is the most recently used.
  fn on_insert(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    let node = self.list.push_front(slot);
    entries[slot].link = Link::Node(node);
  }

  /// When an entry is read, move it to the front of the list.
  fn on_access(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    if let Link::Node(node) = entries[slot].link {
      self.list.move_to_front(node);
    }
  }

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
