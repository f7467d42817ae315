use policy_cache::{Cache, CacheBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

// Pretend this is a slow database query.
fn load_user(id: u32, calls: &AtomicUsize) -> Result<String, std::io::Error> {
  calls.fetch_add(1, Ordering::SeqCst);
  thread::sleep(Duration::from_millis(100));
  if id == 0 {
    return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no user 0"));
  }
  Ok(format!("user-{}", id))
}

fn main() {
  let cache: Cache<u32, String> = CacheBuilder::new()
    .capacity(1_000)
    .build()
    .expect("Failed to build cache");
  let calls = Arc::new(AtomicUsize::new(0));

  // 16 threads ask for the same user at once; the query runs once.
  let num_threads = 16;
  let barrier = Arc::new(Barrier::new(num_threads));
  let handles: Vec<_> = (0..num_threads)
    .map(|_| {
      let cache = cache.clone();
      let calls = Arc::clone(&calls);
      let barrier = Arc::clone(&barrier);
      thread::spawn(move || {
        barrier.wait();
        cache.get_or_set(42, || load_user(42, &calls))
      })
    })
    .collect();

  for handle in handles {
    let user = handle.join().expect("thread panicked").expect("load failed");
    println!("Got {}", user);
  }
  println!("\nLoader calls for 16 concurrent requests: {}", calls.load(Ordering::SeqCst));

  // Failures are handed back and never cached.
  match cache.get_or_set(0, || load_user(0, &calls)) {
    Ok(user) => println!("Unexpected user: {}", user),
    Err(err) => println!("Load failed: {}", err),
  }
  println!("Key 0 cached after failure: {}", cache.contains_key(&0));

  println!("\nCache metrics: {:#?}", cache.metrics());
}
