pub(crate) mod fifo;
pub(crate) mod lfu;
pub(crate) mod lru;
pub(crate) mod null;
pub(crate) mod priority;
pub(crate) mod priority_queue;
pub(crate) mod recency_list;
pub(crate) mod ttl;

use crate::entry::CacheEntry;
use crate::error::BuildError;

use std::fmt;
use std::str::FromStr;

use generational_arena::{Arena, Index};

/// Selects how the cache picks a victim when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EvictionPolicy {
  /// Evicts the least recently read or written entry.
  #[default]
  Lru,
  /// Evicts the oldest inserted entry; reads do not protect it.
  Fifo,
  /// Evicts the entry with the fewest reads and writes, oldest access first.
  Lfu,
  /// Evicts the entry expiring soonest. Entries without an expiration go last.
  Ttl,
  /// Never evicts and never expires; only explicit deletes remove entries.
  None,
}

impl EvictionPolicy {
  /// Whether this policy enforces capacity and expiration at all.
  #[inline]
  pub fn evicts(self) -> bool {
    !matches!(self, EvictionPolicy::None)
  }

  /// Builds the auxiliary structure that backs this policy.
  pub(crate) fn tracker<K, V>(self) -> Box<dyn EvictionTracker<K, V>> {
    match self {
      EvictionPolicy::Lru => Box::new(lru::Lru::new()),
      EvictionPolicy::Fifo => Box::new(fifo::Fifo::new()),
      EvictionPolicy::Lfu => Box::new(lfu::Lfu::new()),
      EvictionPolicy::Ttl => Box::new(ttl::Ttl::new()),
      EvictionPolicy::None => Box::new(null::NullPolicy),
    }
  }
}

impl fmt::Display for EvictionPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      EvictionPolicy::Lru => "lru",
      EvictionPolicy::Fifo => "fifo",
      EvictionPolicy::Lfu => "lfu",
      EvictionPolicy::Ttl => "ttl",
      EvictionPolicy::None => "none",
    };
    f.write_str(name)
  }
}

impl FromStr for EvictionPolicy {
  type Err = BuildError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "lru" => Ok(EvictionPolicy::Lru),
      "fifo" => Ok(EvictionPolicy::Fifo),
      "lfu" => Ok(EvictionPolicy::Lfu),
      "ttl" => Ok(EvictionPolicy::Ttl),
      "none" => Ok(EvictionPolicy::None),
      _ => Err(BuildError::UnknownPolicy(s.to_string())),
    }
  }
}

/// The auxiliary ordering a policy keeps over the live entries.
///
/// Every method runs under the store's exclusive lock. Slots always refer to
/// live entries in `entries`; the tracker records its own handle in the
/// entry's `link` and must reset it to `Link::Detached` in `on_remove`.
pub(crate) trait EvictionTracker<K, V>: Send + Sync {
  /// A new entry was inserted.
  fn on_insert(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>);

  /// An entry was read. Its bookkeeping fields are already updated.
  fn on_access(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>);

  /// An existing entry was overwritten. Its bookkeeping fields are already
  /// updated.
  fn on_update(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>) {
    self.on_access(slot, entries);
  }

  /// An entry is about to be removed from the store.
  fn on_remove(&mut self, slot: Index, entries: &mut Arena<CacheEntry<K, V>>);

  /// The entry this policy would evict next.
  fn victim(&self) -> Option<Index>;

  fn clear(&mut self);

  /// Number of tracked entries.
  fn len(&self) -> usize;

  /// Verifies every handle the tracker holds against `entries`: the entry is
  /// live, its `link` points back at that handle, and the ordering holds.
  #[cfg(test)]
  fn check(&self, entries: &Arena<CacheEntry<K, V>>) -> Result<(), String>;
}

/// Shared by the list-backed policies: each node holds a live slot whose
/// entry links back to that node.
#[cfg(test)]
pub(crate) fn check_list_links<K, V>(
  list: &recency_list::RecencyList<Index>,
  entries: &Arena<CacheEntry<K, V>>,
) -> Result<(), String> {
  use crate::entry::Link;

  for (node, slot) in list.linked_nodes()? {
    let entry = entries
      .get(slot)
      .ok_or_else(|| format!("list node {:?} holds a freed slot", node))?;
    if entry.link != Link::Node(node) {
      return Err(format!(
        "entry in list node {:?} links to {:?}",
        node, entry.link
      ));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_policy_names_case_insensitively() {
    assert_eq!("lru".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Lru));
    assert_eq!("FIFO".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Fifo));
    assert_eq!(" Lfu ".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Lfu));
    assert_eq!("ttl".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Ttl));
    assert_eq!("None".parse::<EvictionPolicy>(), Ok(EvictionPolicy::None));
    assert_eq!(
      "arc".parse::<EvictionPolicy>(),
      Err(BuildError::UnknownPolicy("arc".to_string()))
    );
  }

  #[test]
  fn display_round_trips_through_from_str() {
    for policy in [
      EvictionPolicy::Lru,
      EvictionPolicy::Fifo,
      EvictionPolicy::Lfu,
      EvictionPolicy::Ttl,
      EvictionPolicy::None,
    ] {
      assert_eq!(policy.to_string().parse::<EvictionPolicy>(), Ok(policy));
    }
  }

  #[test]
  fn default_is_lru() {
    assert_eq!(EvictionPolicy::default(), EvictionPolicy::Lru);
    assert!(EvictionPolicy::Lru.evicts());
    assert!(!EvictionPolicy::None.evicts());
  }
}
