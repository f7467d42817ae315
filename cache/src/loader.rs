use crate::error::Result;

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// The internal state of a value being loaded.
enum State<V> {
  Loading,
  Complete(Result<Arc<V>>),
}

/// A load in progress for one key. The leader completes it once; any number
/// of threads can block on it meanwhile.
pub(crate) struct InFlight<V> {
  state: Mutex<State<V>>,
  ready: Condvar,
}

impl<V> InFlight<V> {
  /// Creates a new `InFlight` in the "Loading" state.
  pub(crate) fn new() -> Self {
    Self {
      state: Mutex::new(State::Loading),
      ready: Condvar::new(),
    }
  }

  /// Publishes the result and wakes every waiter. Only the first call has
  /// any effect.
  pub(crate) fn complete(&self, result: Result<Arc<V>>) {
    let mut state = self.state.lock();
    if let State::Loading = *state {
      *state = State::Complete(result);
      self.ready.notify_all();
    }
  }

  /// Blocks until the load completes and returns a clone of its result.
  pub(crate) fn wait(&self) -> Result<Arc<V>> {
    let mut state = self.state.lock();
    loop {
      match &*state {
        State::Complete(result) => return result.clone(),
        State::Loading => self.ready.wait(&mut state),
      }
    }
  }

  #[cfg(test)]
  fn is_complete(&self) -> bool {
    matches!(*self.state.lock(), State::Complete(_))
  }
}

impl<V> Default for InFlight<V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V> std::fmt::Debug for InFlight<V> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let complete = matches!(*self.state.lock(), State::Complete(_));
    f.debug_struct("InFlight")
      .field("complete", &complete)
      .finish()
  }
}
