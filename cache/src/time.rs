use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// The single, static reference point for all system clock readings.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// A source of "current time" for expiration and access bookkeeping.
///
/// Readings are durations since an arbitrary fixed epoch. They must never go
/// backwards for a given clock instance.
pub trait Clock: Send + Sync + fmt::Debug {
  fn now(&self) -> Duration;
}

/// The default clock, backed by `Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now(&self) -> Duration {
    Instant::now().saturating_duration_since(*CACHE_EPOCH)
  }
}

/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test can hand one clone to the cache
/// and advance another.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
  nanos: Arc<AtomicU64>,
}

impl ManualClock {
  /// Creates a clock reading zero.
  pub fn new() -> Self {
    Self::default()
  }

  /// Moves the clock forward by `by`.
  pub fn advance(&self, by: Duration) {
    self.nanos.fetch_add(as_nanos(by), Ordering::SeqCst);
  }

  /// Sets the reading to `to`. Setting it backwards is allowed but breaks the
  /// monotonicity the cache relies on; only do that between tests.
  pub fn set(&self, to: Duration) {
    self.nanos.store(as_nanos(to), Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  #[inline]
  fn now(&self) -> Duration {
    Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
  }
}

/// Converts a duration into the nanosecond representation stored in entries,
/// saturating instead of wrapping for absurdly long durations.
#[inline]
pub(crate) fn as_nanos(duration: Duration) -> u64 {
  u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
