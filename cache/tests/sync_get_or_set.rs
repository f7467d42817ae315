use policy_cache::{Cache, CacheBuilder, EvictionPolicy, LoadError};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  mpsc, Arc, Barrier,
};
use std::thread;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
struct BackendDown;

fn new_cache() -> Cache<String, u64> {
  CacheBuilder::new().capacity(100).build().unwrap()
}

// Spins until `n` callers are parked on an in-flight load.
fn wait_for_waiters(cache: &Cache<String, u64>, n: u64) {
  while cache.metrics().coalesced_loads < n {
    thread::yield_now();
  }
}

#[test]
fn test_get_or_set_hit_skips_loader() {
  let cache = new_cache();
  cache.set("a".to_string(), 1);

  let value = cache
    .get_or_set("a".to_string(), || -> Result<u64, BackendDown> {
      panic!("loader must not run on a hit")
    })
    .unwrap();

  assert_eq!(*value, 1);
  assert_eq!(cache.metrics().loads, 0);
}

#[test]
fn test_get_or_set_miss_loads_and_stores() {
  let cache = new_cache();

  let value = cache
    .get_or_set("a".to_string(), || Ok::<_, BackendDown>(42))
    .unwrap();
  assert_eq!(*value, 42);
  assert_eq!(cache.get("a").map(|v| *v), Some(42));

  let metrics = cache.metrics();
  assert_eq!(metrics.loads, 1);
  assert_eq!(metrics.inserts, 1);
  assert_eq!(metrics.misses, 1);
}

#[test]
fn test_get_or_set_error_is_not_cached() {
  let cache = new_cache();
  let calls = AtomicUsize::new(0);

  let err = cache
    .get_or_set("a".to_string(), || {
      calls.fetch_add(1, Ordering::SeqCst);
      Err::<u64, _>(BackendDown)
    })
    .unwrap_err();

  assert!(err.downcast_ref::<BackendDown>().is_some());
  assert!(!cache.contains_key("a"));
  assert_eq!(cache.len(), 0);

  let value = cache
    .get_or_set("a".to_string(), || {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok::<_, BackendDown>(7)
    })
    .unwrap();
  assert_eq!(*value, 7);
  assert_eq!(calls.load(Ordering::SeqCst), 2, "the failed load must be retried");
  assert_eq!(cache.metrics().load_failures, 1);
}

#[test]
fn test_get_or_set_singleflight() {
  let cache = new_cache();
  let load_count = Arc::new(AtomicUsize::new(0));
  let num_threads = 100;
  let barrier = Arc::new(Barrier::new(num_threads));

  let handles: Vec<_> = (0..num_threads)
    .map(|_| {
      let cache = cache.clone();
      let load_count = Arc::clone(&load_count);
      let barrier = Arc::clone(&barrier);
      thread::spawn(move || {
        barrier.wait();
        cache
          .get_or_set("key".to_string(), || {
            load_count.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok::<_, BackendDown>(99)
          })
          .unwrap()
      })
    })
    .collect();

  let results: Vec<Arc<u64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

  assert_eq!(load_count.load(Ordering::SeqCst), 1, "loader should run exactly once");
  assert!(results.iter().all(|value| Arc::ptr_eq(value, &results[0])));
  assert_eq!(*results[0], 99);
  assert_eq!(cache.len(), 1);
}

#[test]
fn test_get_or_set_waiters_share_the_error() {
  let cache = new_cache();
  let (go_tx, go_rx) = mpsc::channel::<()>();
  let (started_tx, started_rx) = mpsc::channel::<()>();

  let leader = {
    let cache = cache.clone();
    thread::spawn(move || {
      cache.get_or_set("a".to_string(), move || {
        started_tx.send(()).unwrap();
        go_rx.recv().unwrap();
        Err::<u64, _>(BackendDown)
      })
    })
  };
  started_rx.recv().unwrap();

  let waiters: Vec<_> = (0..3)
    .map(|_| {
      let cache = cache.clone();
      thread::spawn(move || {
        cache.get_or_set("a".to_string(), || -> Result<u64, BackendDown> {
          panic!("waiters must not run their loader")
        })
      })
    })
    .collect();
  wait_for_waiters(&cache, 3);
  go_tx.send(()).unwrap();

  let leader_err = leader.join().unwrap().unwrap_err();
  for waiter in waiters {
    let err = waiter.join().unwrap().unwrap_err();
    match (&leader_err, &err) {
      (LoadError::Failed(a), LoadError::Failed(b)) => assert!(Arc::ptr_eq(a, b)),
      other => panic!("expected shared loader errors, got {:?}", other),
    }
  }
  assert!(!cache.contains_key("a"));
  assert_eq!(cache.metrics().loads, 1);
}

#[test]
fn test_get_or_set_different_keys_do_not_block() {
  let cache = new_cache();
  let (go_tx, go_rx) = mpsc::channel::<()>();
  let (started_tx, started_rx) = mpsc::channel::<()>();

  let slow = {
    let cache = cache.clone();
    thread::spawn(move || {
      cache.get_or_set("slow".to_string(), move || {
        started_tx.send(()).unwrap();
        go_rx.recv().unwrap();
        Ok::<_, BackendDown>(1)
      })
    })
  };
  started_rx.recv().unwrap();

  // Completes while the other load is still blocked.
  let fast = cache
    .get_or_set("fast".to_string(), || Ok::<_, BackendDown>(2))
    .unwrap();
  assert_eq!(*fast, 2);
  assert!(!cache.contains_key("slow"));

  go_tx.send(()).unwrap();
  assert_eq!(*slow.join().unwrap().unwrap(), 1);
  assert!(cache.contains_key("slow"));
}

#[test]
fn test_get_or_set_panicking_loader_releases_waiters() {
  let cache = new_cache();
  let (go_tx, go_rx) = mpsc::channel::<()>();
  let (started_tx, started_rx) = mpsc::channel::<()>();

  let leader = {
    let cache = cache.clone();
    thread::spawn(move || {
      cache.get_or_set("a".to_string(), move || -> Result<u64, BackendDown> {
        started_tx.send(()).unwrap();
        go_rx.recv().unwrap();
        panic!("loader exploded")
      })
    })
  };
  started_rx.recv().unwrap();

  let waiter = {
    let cache = cache.clone();
    thread::spawn(move || {
      cache.get_or_set("a".to_string(), || Ok::<_, BackendDown>(5))
    })
  };
  wait_for_waiters(&cache, 1);
  go_tx.send(()).unwrap();

  assert!(leader.join().is_err(), "the panic reaches the leader's caller");
  assert!(matches!(waiter.join().unwrap(), Err(LoadError::Abandoned)));

  let value = cache
    .get_or_set("a".to_string(), || Ok::<_, BackendDown>(5))
    .unwrap();
  assert_eq!(*value, 5, "a fresh load starts after an abandoned one");
}

#[test]
fn test_get_or_set_respects_capacity() {
  let cache: Cache<String, u64> = CacheBuilder::new()
    .capacity(2)
    .policy(EvictionPolicy::Fifo)
    .build()
    .unwrap();

  for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
    cache
      .get_or_set(key.to_string(), || Ok::<_, BackendDown>(i as u64))
      .unwrap();
  }

  assert_eq!(cache.len(), 2);
  assert!(!cache.contains_key("a"));
  assert_eq!(cache.metrics().evicted_by_capacity, 1);
}

#[test]
fn test_get_or_set_reloads_expired_entries() {
  let clock = policy_cache::ManualClock::new();
  let cache: Cache<String, u64> = CacheBuilder::new()
    .default_ttl(Duration::from_millis(50))
    .clock(clock.clone())
    .build()
    .unwrap();

  cache.set("a".to_string(), 1);
  clock.advance(Duration::from_millis(60));

  let value = cache
    .get_or_set("a".to_string(), || Ok::<_, BackendDown>(2))
    .unwrap();
  assert_eq!(*value, 2);
  assert_eq!(cache.metrics().evicted_by_ttl, 1);
}
