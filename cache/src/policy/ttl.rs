use super::priority::{PriorityOrder, PriorityTracker};
use crate::entry::CacheEntry;

use std::cmp::Ordering;

/// Orders by expiration time, soonest first. Entries that never expire sort
/// after every entry that does.
#[derive(Debug)]
pub(crate) struct ByExpiration;

impl PriorityOrder for ByExpiration {
  #[inline]
  fn compare<K, V>(a: &CacheEntry<K, V>, b: &CacheEntry<K, V>) -> Ordering {
    let by_expiry = match (a.expires_at, b.expires_at) {
      (Some(a), Some(b)) => a.cmp(&b),
      (Some(_), None) => Ordering::Less,
      (None, Some(_)) => Ordering::Greater,
      (None, None) => Ordering::Equal,
    };
    by_expiry
      .then_with(|| a.last_accessed.cmp(&b.last_accessed))
      .then_with(|| a.sequence.cmp(&b.sequence))
  }
}

/// An eviction policy that evicts the entry closest to expiring.
pub(crate) type Ttl = PriorityTracker<ByExpiration>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::policy::EvictionTracker;
  use generational_arena::{Arena, Index};
  use std::sync::Arc;

  type Entries = Arena<CacheEntry<&'static str, ()>>;

  fn admit(
    policy: &mut Ttl,
    entries: &mut Entries,
    key: &'static str,
    expires_at: Option<u64>,
    sequence: u64,
  ) -> Index {
    let slot = entries.insert(CacheEntry::new(key, Arc::new(()), 0, expires_at, sequence));
    policy.on_insert(slot, entries);
    slot
  }

  fn victim_key(policy: &Ttl, entries: &Entries) -> Option<&'static str> {
    <Ttl as EvictionTracker<&str, ()>>::victim(policy).map(|slot| entries[slot].key)
  }

  #[test]
  fn soonest_expiration_is_the_victim() {
    let mut entries = Arena::new();
    let mut policy = Ttl::new();
    admit(&mut policy, &mut entries, "late", Some(300), 0);
    admit(&mut policy, &mut entries, "soon", Some(100), 1);
    admit(&mut policy, &mut entries, "middle", Some(200), 2);

    assert_eq!(victim_key(&policy, &entries), Some("soon"));
  }

  #[test]
  fn entries_without_expiry_go_last() {
    let mut entries = Arena::new();
    let mut policy = Ttl::new();
    admit(&mut policy, &mut entries, "forever", None, 0);
    admit(&mut policy, &mut entries, "far", Some(u64::MAX - 1), 1);

    assert_eq!(victim_key(&policy, &entries), Some("far"));
  }

  #[test]
  fn entries_without_expiry_tie_break_by_access() {
    let mut entries = Arena::new();
    let mut policy = Ttl::new();
    let a = admit(&mut policy, &mut entries, "a", None, 0);
    admit(&mut policy, &mut entries, "b", None, 1);

    entries[a].touch(10, 2);
    policy.on_access(a, &mut entries);

    assert_eq!(victim_key(&policy, &entries), Some("b"));
    policy.check(&entries).unwrap();
  }

  #[test]
  fn update_with_a_later_expiry_moves_the_entry_back() {
    let mut entries = Arena::new();
    let mut policy = Ttl::new();
    let a = admit(&mut policy, &mut entries, "a", Some(100), 0);
    admit(&mut policy, &mut entries, "b", Some(150), 1);

    entries[a].replace(Arc::new(()), 50, Some(250), 2);
    policy.on_update(a, &mut entries);

    assert_eq!(victim_key(&policy, &entries), Some("b"));
    policy.check(&entries).unwrap();
  }
}
