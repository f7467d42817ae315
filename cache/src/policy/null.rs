use super::EvictionTracker;
use crate::entry::CacheEntry;

use generational_arena::{Arena, Index};

/// A "no-op" policy for caches that never evict.
/// It tracks nothing and never offers a victim.
#[derive(Debug, Default)]
pub(crate) struct NullPolicy;

impl<K, V> EvictionTracker<K, V> for NullPolicy {
  fn on_insert(&mut self, _slot: Index, _entries: &mut Arena<CacheEntry<K, V>>) {}

  fn on_access(&mut self, _slot: Index, _entries: &mut Arena<CacheEntry<K, V>>) {}

  fn on_remove(&mut self, _slot: Index, _entries: &mut Arena<CacheEntry<K, V>>) {}

  fn victim(&self) -> Option<Index> {
    None
  }

  fn clear(&mut self) {}

  fn len(&self) -> usize {
    0
  }

  #[cfg(test)]
  fn check(&self, entries: &Arena<CacheEntry<K, V>>) -> Result<(), String> {
    match entries.iter().find(|(_, entry)| entry.link != crate::entry::Link::Detached) {
      Some((_, entry)) => Err(format!("untracked entry has link {:?}", entry.link)),
      None => Ok(()),
    }
  }
}
