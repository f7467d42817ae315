//! A thread-safe, in-process key-value cache with pluggable eviction and
//! single-flight loading.
//!
//! # Features
//! - **Eviction Policies**: LRU, FIFO, LFU and TTL-ordered eviction, or
//!   `None` for a cache that only shrinks on explicit deletes.
//! - **Lazy Expiration**: per-cache default and per-entry time-to-live,
//!   checked when an entry is read. No background threads.
//! - **Single-Flight Loads**: `get_or_set` runs one loader per key no matter
//!   how many threads miss at once, and shares its value or error.
//! - **Non-Clone Support**: Stores values in an `Arc<V>`, avoiding `V: Clone` bounds.
//! - **Observability**: lock-free metrics, an eviction listener and `tracing`
//!   events.
//! - **Configuration**: a plain `CacheConfig`, deserializable with the
//!   optional `serde` feature.
//!
//! ```
//! use policy_cache::{Cache, EvictionPolicy};
//!
//! let cache = Cache::builder()
//!   .capacity(2)
//!   .policy(EvictionPolicy::Lru)
//!   .build()
//!   .unwrap();
//!
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get("a");
//! cache.set("c", 3);
//!
//! assert!(cache.get("b").is_none());
//! assert_eq!(cache.get("a").as_deref(), Some(&1));
//! ```

// Public modules that form the API
pub mod builder;
pub mod config;
pub mod error;
pub mod handles;
pub mod listener;
pub mod metrics;
pub mod policy;
pub mod time;

// Internal, crate-only modules
mod entry;
mod loader;
mod shared;
mod store;


// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use config::CacheConfig;
pub use entry::EntryMetadata;
pub use error::{BuildError, LoadError};
pub use handles::Cache;
pub use listener::{EvictionListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use policy::EvictionPolicy;
pub use time::{Clock, ManualClock, SystemClock};
