use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The configured capacity was negative. Use `0` for an unbounded cache.
  #[error("cache capacity cannot be negative (got {0})")]
  NegativeCapacity(i64),
  /// The policy name did not match any known eviction policy.
  #[error("unknown eviction policy '{0}'")]
  UnknownPolicy(String),
}

/// The error returned by [`Cache::get_or_set`](crate::Cache::get_or_set).
///
/// Every caller waiting on the same load receives a clone of the same error.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
  /// The loader returned an error. Nothing was cached.
  #[error("loader failed: {0}")]
  Failed(#[source] Arc<dyn StdError + Send + Sync>),
  /// The loader panicked before producing a value.
  #[error("loader panicked before producing a value")]
  Abandoned,
}

impl LoadError {
  pub(crate) fn failed(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
    LoadError::Failed(Arc::from(err.into()))
  }

  /// Returns the loader's original error if it is of type `E`.
  pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
    match self {
      LoadError::Failed(err) => (**err).downcast_ref::<E>(),
      LoadError::Abandoned => None,
    }
  }
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
