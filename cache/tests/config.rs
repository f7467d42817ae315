use policy_cache::{BuildError, Cache, CacheBuilder, CacheConfig, EvictionPolicy};
use std::time::Duration;

#[test]
fn test_config_deserializes_with_defaults() {
  let config: CacheConfig = serde_json::from_str("{}").unwrap();
  assert_eq!(config, CacheConfig::default());

  let config: CacheConfig = serde_json::from_str(r#"{ "policy": "fifo" }"#).unwrap();
  assert_eq!(config.policy, EvictionPolicy::Fifo);
  assert_eq!(config.capacity, 0);
}

#[test]
fn test_config_parses_human_durations() {
  let config: CacheConfig =
    serde_json::from_str(r#"{ "capacity": 10, "policy": "ttl", "default_ttl": "1m 30s" }"#).unwrap();
  assert_eq!(config.default_ttl, Some(Duration::from_secs(90)));

  let config: CacheConfig = serde_json::from_str(r#"{ "default_ttl": null }"#).unwrap();
  assert_eq!(config.default_ttl, None);
}

#[test]
fn test_config_rejects_bad_input() {
  assert!(serde_json::from_str::<CacheConfig>(r#"{ "policy": "arc" }"#).is_err());
  assert!(serde_json::from_str::<CacheConfig>(r#"{ "default_ttl": "soon" }"#).is_err());
  assert!(serde_json::from_str::<CacheConfig>(r#"{ "shards": 4 }"#).is_err());
}

#[test]
fn test_config_round_trips() {
  let config = CacheConfig::new(256, EvictionPolicy::Lfu).with_default_ttl(Duration::from_millis(50));
  let json = serde_json::to_string(&config).unwrap();
  assert!(json.contains(r#""default_ttl":"50ms""#), "{}", json);
  assert!(json.contains(r#""policy":"lfu""#), "{}", json);

  let parsed: CacheConfig = serde_json::from_str(&json).unwrap();
  assert_eq!(parsed, config);
}

#[test]
fn test_negative_capacity_is_rejected() {
  let config: CacheConfig = serde_json::from_str(r#"{ "capacity": -1 }"#).unwrap();

  let err = Cache::<String, u32>::new(config).unwrap_err();
  assert_eq!(err, BuildError::NegativeCapacity(-1));

  let err = CacheBuilder::<String, u32>::from_config(&config).unwrap_err();
  assert_eq!(err, BuildError::NegativeCapacity(-1));
}

#[test]
fn test_config_builds_matching_cache() {
  let config: CacheConfig =
    serde_json::from_str(r#"{ "capacity": 2, "policy": "fifo", "default_ttl": "0s" }"#).unwrap();
  let cache: Cache<&str, u32> = Cache::new(config).unwrap();

  assert_eq!(cache.capacity(), 2);
  assert_eq!(cache.policy(), EvictionPolicy::Fifo);

  cache.set("a", 1);
  assert_eq!(cache.metadata("a").and_then(|m| m.expires_at), None, "a zero TTL never expires");
}

#[test]
fn test_policy_names_parse_from_strings() {
  assert_eq!("LRU".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Lru));
  assert_eq!(
    "random".parse::<EvictionPolicy>(),
    Err(BuildError::UnknownPolicy("random".to_string()))
  );
}
