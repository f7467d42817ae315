use crate::error::BuildError;
use crate::policy::EvictionPolicy;

use std::time::Duration;

/// Plain configuration for a [`Cache`](crate::Cache), suitable for loading
/// from a config file.
///
/// With the `serde` feature, missing fields take their defaults and unknown
/// fields are rejected. `default_ttl` is written as a human-readable duration:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// # use policy_cache::{CacheConfig, EvictionPolicy};
/// # use std::time::Duration;
/// let config: CacheConfig =
///   serde_json::from_str(r#"{ "capacity": 500, "policy": "lfu", "default_ttl": "5m" }"#).unwrap();
/// assert_eq!(config.policy, EvictionPolicy::Lfu);
/// assert_eq!(config.default_ttl, Some(Duration::from_secs(300)));
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct CacheConfig {
  /// Maximum number of entries. `0` means unbounded; negative values are
  /// rejected when the cache is built.
  pub capacity: i64,
  pub policy: EvictionPolicy,
  /// Expiration applied to entries written without their own TTL.
  /// `None` or zero means entries never expire.
  #[cfg_attr(feature = "serde", serde(with = "humantime_option"))]
  pub default_ttl: Option<Duration>,
}

impl CacheConfig {
  pub fn new(capacity: i64, policy: EvictionPolicy) -> Self {
    Self {
      capacity,
      policy,
      default_ttl: None,
    }
  }

  pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
    self.default_ttl = Some(ttl);
    self
  }

  /// Checks the configuration and returns the capacity as an entry count.
  pub fn validate(&self) -> Result<usize, BuildError> {
    if self.capacity < 0 {
      return Err(BuildError::NegativeCapacity(self.capacity));
    }
    Ok(usize::try_from(self.capacity).unwrap_or(usize::MAX))
  }
}

#[cfg(feature = "serde")]
mod humantime_option {
  use serde::{Deserialize, Deserializer, Serializer};
  use std::time::Duration;

  pub(super) fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match value {
      Some(duration) => {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
      }
      None => serializer.serialize_none(),
    }
  }

  pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
  where
    D: Deserializer<'de>,
  {
    Option::<String>::deserialize(deserializer)?
      .map(|raw| humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom))
      .transpose()
  }
}
