mod shared;

use std::{collections::HashMap, thread, time::Duration};

use cache::{ConfigurationError, Connector, ConnectorConfig, Store, Value};
use dashcache::{DashCache, DashConnector};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::tracing_init;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Session {
    user_id: u64,
    scopes: Vec<String>,
}

#[test]
fn values_round_trip() {
    tracing_init();
    let cache = DashCache::new("app:");

    cache.forever("int", &42).unwrap();
    cache.forever("float", &42.5).unwrap();
    cache.forever("text", "hello").unwrap();
    cache.forever("map", &json!({"a": [1, 2]})).unwrap();

    assert_eq!(cache.get("int").unwrap(), Some(Value::Int(42)));
    assert_eq!(cache.get("float").unwrap(), Some(Value::Float(42.5)));
    assert_eq!(cache.get("text").unwrap(), Some(Value::Text("hello".into())));
    assert_eq!(
        cache.get("map").unwrap(),
        Some(Value::Structured(json!({"a": [1, 2]})))
    );
    assert_eq!(cache.get("missing").unwrap(), None);
}

#[test]
fn structs_round_trip() {
    let cache = DashCache::default();
    let session = Session {
        user_id: 7,
        scopes: vec!["read".into(), "write".into()],
    };

    cache.put("session", &session, 30).unwrap();

    assert_eq!(cache.get_struct::<Session>("session").unwrap(), Some(session));
}

#[test]
fn counters() {
    let cache = DashCache::default();

    assert_eq!(cache.increment("c", 5).unwrap(), 5);
    assert_eq!(cache.increment("c", 3).unwrap(), 8);
    assert_eq!(cache.decrement("c", 8).unwrap(), 0);

    cache.forever("f", &2.75).unwrap();
    assert_eq!(cache.increment("f", 1).unwrap(), 3);

    cache.forever("s", "text").unwrap();
    assert_eq!(cache.increment("s", 2).unwrap(), 2);
}

#[test]
fn counters_reject_numbers_beyond_i64() {
    tracing_init();

    let cache = DashCache::default();
    cache.forever("big", &-1e30).unwrap();

    assert!(cache.get_int("big").is_err());
    assert!(cache.increment("big", 1).is_err());
    assert_eq!(cache.get("big").unwrap(), Some(Value::Float(-1e30)));
}

#[test]
fn concurrent_increments_are_not_lost() {
    let cache = DashCache::default();

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..1000 {
                    cache.increment("hits", 1).unwrap();
                }
            });
        }
    });

    assert_eq!(cache.get_int("hits").unwrap(), 8000);
}

#[test]
fn concurrent_tagged_increments_are_not_lost() {
    let cache = DashCache::default();

    // create the tag version up front, first use of a tag is not atomic
    cache.tags(["t"]).tag_set().tag_id("t").unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let tagged = cache.tags(["t"]);
                for _ in 0..500 {
                    tagged.increment("hits", 1).unwrap();
                }
            });
        }
    });

    assert_eq!(cache.tags(["t"]).get_int("hits").unwrap(), 2000);
}

#[test]
fn entries_expire() {
    let cache = DashCache::default();

    cache
        .put_raw("short", "1".into(), Some(Duration::from_millis(20)))
        .unwrap();
    cache.forever("long", &1).unwrap();

    assert_eq!(cache.get("short").unwrap(), Some(Value::Int(1)));

    thread::sleep(Duration::from_millis(60));

    assert_eq!(cache.get("short").unwrap(), None);
    assert!(!cache.forget("short").unwrap());
    assert_eq!(cache.get("long").unwrap(), Some(Value::Int(1)));
    assert_eq!(cache.len(), 1);
}

#[test]
fn put_with_minutes_is_readable_before_expiry() {
    let cache = DashCache::default();

    cache.put("k", &1, 1).unwrap();

    assert_eq!(cache.get("k").unwrap(), Some(Value::Int(1)));
}

#[test]
fn purge_expired_drops_only_expired_entries() {
    let cache = DashCache::default();

    for key in ["a", "b", "c"] {
        cache
            .put_raw(key, "1".into(), Some(Duration::from_millis(10)))
            .unwrap();
    }
    cache.forever("d", &1).unwrap();

    thread::sleep(Duration::from_millis(40));

    assert_eq!(cache.purge_expired(), 3);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.purge_expired(), 0);
}

#[test]
fn increment_keeps_the_expiry() {
    let cache = DashCache::default();

    cache
        .put_raw("c", "1".into(), Some(Duration::from_millis(30)))
        .unwrap();
    assert_eq!(cache.increment("c", 1).unwrap(), 2);

    thread::sleep(Duration::from_millis(80));

    assert_eq!(cache.get("c").unwrap(), None);
}

#[test]
fn expired_counters_restart() {
    let cache = DashCache::default();

    cache
        .put_raw("c", "10".into(), Some(Duration::from_millis(10)))
        .unwrap();

    thread::sleep(Duration::from_millis(40));

    assert_eq!(cache.increment("c", 1).unwrap(), 1);
    assert_eq!(cache.get("c").unwrap(), Some(Value::Int(1)));
}

#[test]
fn forget_and_flush() {
    let cache = DashCache::new("app:");

    cache.forever("a", &1).unwrap();
    cache.forever("b", &2).unwrap();

    assert!(cache.forget("a").unwrap());
    assert!(!cache.forget("a").unwrap());
    assert_eq!(cache.len(), 1);

    assert!(cache.flush().unwrap());
    assert!(cache.is_empty());
}

#[test]
fn tag_invalidation() {
    let cache = DashCache::new("app:");

    cache.tags(["people"]).forever("ada", "Ada").unwrap();
    cache.tags(["authors"]).forever("ada", "Ada L.").unwrap();

    cache.tags(["people"]).flush().unwrap();

    assert_eq!(cache.tags(["people"]).get("ada").unwrap(), None);
    assert_eq!(
        cache.tags(["authors"]).get("ada").unwrap(),
        Some(Value::Text("Ada L.".into()))
    );
}

#[test]
fn bulk_round_trip() {
    let cache = DashCache::new("bulk:");

    let values: HashMap<String, i64> = (0..100).map(|i| (format!("k{}", i), i * 3)).collect();
    cache.put_many(&values, 0).unwrap();

    let keys: Vec<&str> = values.keys().map(String::as_str).collect();
    let read = cache.many(&keys).unwrap();

    assert_eq!(read.len(), 100);
    for (key, value) in &values {
        assert_eq!(read[key], Some(Value::Int(*value)));
    }
}

#[test]
fn connector_requires_a_prefix() {
    let err = DashConnector.connect(&ConnectorConfig::new()).err().unwrap();

    assert!(matches!(
        err,
        ConfigurationError::Missing { key: "prefix", .. }
    ));
}

#[test]
fn connector_builds_a_prefixed_store() {
    let config: ConnectorConfig = [("prefix", "app:")].into_iter().collect();
    let cache = DashConnector.connect(&config).unwrap();

    assert_eq!(cache.prefix(), "app:");
    cache.forever("k", &1).unwrap();
    assert_eq!(cache.get("k").unwrap(), Some(Value::Int(1)));
}
