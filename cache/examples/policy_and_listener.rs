use policy_cache::{CacheBuilder, EvictionListener, EvictionPolicy, EvictionReason};
use std::sync::Arc;

// A simple listener that just prints evicted entries.
struct MyListener;

impl EvictionListener<i32, String> for MyListener {
  fn on_evict(&self, key: i32, value: Arc<String>, reason: EvictionReason) {
    println!(
      "[Listener] Item evicted! Key: {}, Value: '{}', Reason: {}",
      key, value, reason
    );
  }
}

fn main() {
  println!("--- LFU Cache with Eviction Listener ---");

  let cache = CacheBuilder::new()
    .capacity(3) // A small capacity to easily trigger evictions
    .policy(EvictionPolicy::Lfu)
    .eviction_listener(MyListener)
    .build()
    .expect("Failed to build cache");

  println!("Cache created with LFU policy and capacity 3.");

  // Insert 3 items. Cache is now full.
  cache.set(1, "one".to_string());
  cache.set(2, "two".to_string());
  cache.set(3, "three".to_string());
  println!("\nInserted keys 1, 2, 3. Cache is full.");

  // Read keys 1 and 3 so that key 2 is the least frequently used.
  println!("\nReading keys 1 and 3...");
  cache.get(&1);
  cache.get(&3);
  cache.get(&3);

  // Insert a 4th item. The listener runs before `set` returns.
  println!("\nInserting key 4. This will trigger an eviction.");
  cache.set(4, "four".to_string());

  println!("\n--- Final State ---");
  assert!(cache.get(&2).is_none(), "Key 2 should have been evicted");
  assert!(cache.get(&1).is_some());
  assert!(cache.get(&3).is_some());
  assert!(cache.get(&4).is_some());

  for key in [1, 3, 4] {
    if let Some(metadata) = cache.metadata(&key) {
      println!("Key {}: frequency {}", key, metadata.frequency);
    }
  }

  println!("\nDeleting key 1 explicitly.");
  cache.delete(&1);

  println!("\nCache metrics: {:#?}", cache.metrics());
}
