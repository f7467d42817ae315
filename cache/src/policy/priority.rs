use super::priority_queue::{HeapSlots, PriorityQueue};
use super::EvictionTracker;
use crate::entry::{CacheEntry, Link};

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use generational_arena::{Arena, Index};

/// A total order over entries. The smallest entry is the eviction victim.
pub(crate) trait PriorityOrder: Send + Sync + 'static {
  fn compare<K, V>(a: &CacheEntry<K, V>, b: &CacheEntry<K, V>) -> Ordering;
}

/// Lets the heap compare entries in place and write positions back into them.
struct EntrySlots<'a, K, V, O> {
  entries: &'a mut Arena<CacheEntry<K, V>>,
  _order: PhantomData<O>,
}

impl<'a, K, V, O: PriorityOrder> EntrySlots<'a, K, V, O> {
  fn new(entries: &'a mut Arena<CacheEntry<K, V>>) -> Self {
    Self {
      entries,
      _order: PhantomData,
    }
  }
}

impl<K, V, O: PriorityOrder> HeapSlots for EntrySlots<'_, K, V, O> {
  type Slot = Index;

  #[inline]
  fn less(&self, a: Index, b: Index) -> bool {
    O::compare(&self.entries[a], &self.entries[b]) == Ordering::Less
  }

  #[inline]
  fn set_position(&mut self, slot: Index, position: usize) {
    self.entries[slot].link = Link::Heap(position);
  }
}

/// A policy backed by an indexed min-heap ordered by `O`.
///
/// Every touch re-fixes the touched entry's position, so the root is always
/// the current victim.
pub(crate) struct PriorityTracker<O> {
  heap: PriorityQueue<Index>,
  _order: PhantomData<fn() -> O>,
}

impl<O> fmt::Debug for PriorityTracker<O> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PriorityTracker")
      .field("len", &self.heap.len())
      .finish()
  }
}

impl<O: PriorityOrder> PriorityTracker<O> {
  pub fn new() -> Self {
    Self {
      heap: PriorityQueue::new(),
      _order: PhantomData,
    }
  }

  fn refix<K, V>(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    if let Link::Heap(position) = entries[slot].link {
      self.heap.fix(position, &mut EntrySlots::<K, V, O>::new(entries));
    }
  }
}

impl<K, V, O: PriorityOrder> EvictionTracker<K, V> for PriorityTracker<O> {
  fn on_insert(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    self.heap.push(slot, &mut EntrySlots::<K, V, O>::new(entries));
  }

  fn on_access(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    self.refix(slot, entries);
  }

  fn on_remove(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    if let Link::Heap(position) = entries[slot].link {
      self
        .heap
        .remove(position, &mut EntrySlots::<K, V, O>::new(entries));
      entries[slot].link = Link::Detached;
    }
  }

  fn victim(&self) -> Option<Index> {
    self.heap.peek()
  }

  fn clear(&mut self) {
    self.heap.clear();
  }

  fn len(&self) -> usize {
    self.heap.len()
  }

  #[cfg(test)]
  fn check(&self, entries: &Arena<CacheEntry<K, V>>) -> Result<(), String> {
    let items = self.heap.items();
    for (position, &slot) in items.iter().enumerate() {
      let entry = entries
        .get(slot)
        .ok_or_else(|| format!("heap position {} holds a freed slot", position))?;
      if entry.link != Link::Heap(position) {
        return Err(format!(
          "entry at heap position {} links to {:?}",
          position, entry.link
        ));
      }
      if position > 0 {
        let parent = &entries[items[(position - 1) / 2]];
        if O::compare(entry, parent) == Ordering::Less {
          return Err(format!("heap position {} orders before its parent", position));
        }
      }
    }
    Ok(())
  }
}
