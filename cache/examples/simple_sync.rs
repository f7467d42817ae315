use policy_cache::{Cache, CacheConfig, EvictionPolicy};
use std::thread;
use std::time::Duration;

fn main() {
  // Create a cache with a capacity of 100 items and a 2-second TTL.
  let config = CacheConfig::new(100, EvictionPolicy::Lru).with_default_ttl(Duration::from_secs(2));
  let cache: Cache<String, u32> = Cache::new(config).expect("Failed to build cache");

  println!("Inserting ('key1', 100) into the cache.");
  cache.set("key1".to_string(), 100);

  // Get the value.
  match cache.get("key1") {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found."),
  }

  println!("\nCache metrics: {:#?}", cache.metrics());

  println!("\nWaiting for 3 seconds for the item to expire...");
  thread::sleep(Duration::from_secs(3));

  // Expiration is noticed on the next read.
  println!("Entries before reading: {}", cache.len());
  match cache.get("key1") {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found (as expected after TTL)."),
  }
  println!("Entries after reading: {}", cache.len());

  println!("\nCache metrics after expiration: {:#?}", cache.metrics());
}
