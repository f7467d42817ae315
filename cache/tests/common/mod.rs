#![allow(dead_code)]

use std::sync::{
  mpsc::{self, Receiver, Sender},
  Arc,
};

use policy_cache::{Cache, CacheBuilder, EvictionListener, EvictionPolicy, EvictionReason, ManualClock};

pub type Event = (&'static str, i32, EvictionReason);

// Forwards every notification into a channel so tests can assert on them in
// order.
pub struct RecordingListener {
  sender: Sender<Event>,
}

impl EvictionListener<&'static str, i32> for RecordingListener {
  fn on_evict(&self, key: &'static str, value: Arc<i32>, reason: EvictionReason) {
    let _ = self.sender.send((key, *value, reason));
  }
}

pub fn recording_listener() -> (RecordingListener, Receiver<Event>) {
  let (sender, receiver) = mpsc::channel();
  (RecordingListener { sender }, receiver)
}

// Builds a cache driven by a manual clock, handing back a clone of the clock.
pub fn build_test_cache(
  policy: EvictionPolicy,
  capacity: usize,
) -> (Cache<&'static str, i32>, ManualClock) {
  let clock = ManualClock::new();
  let cache = CacheBuilder::new()
    .policy(policy)
    .capacity(capacity)
    .clock(clock.clone())
    .build()
    .unwrap();
  (cache, clock)
}

pub fn build_test_cache_with_listener(
  policy: EvictionPolicy,
  capacity: usize,
) -> (Cache<&'static str, i32>, ManualClock, Receiver<Event>) {
  let clock = ManualClock::new();
  let (listener, events) = recording_listener();
  let cache = CacheBuilder::new()
    .policy(policy)
    .capacity(capacity)
    .clock(clock.clone())
    .eviction_listener(listener)
    .build()
    .unwrap();
  (cache, clock, events)
}

pub fn value(cache: &Cache<&'static str, i32>, key: &'static str) -> Option<i32> {
  cache.get(key).map(|v| *v)
}

pub fn drain(events: &Receiver<Event>) -> Vec<Event> {
  events.try_iter().collect()
}
