#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use cache::{Error, Store};

/// Plain map store that records every backend call.
#[derive(Default)]
pub struct MapStore {
    prefix: String,
    entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
    writes: AtomicUsize,
    deletes: AtomicUsize,
}

impl MapStore {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Default::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Looks up a full backend key, prefix included.
    pub fn raw(&self, full_key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(full_key)
            .map(|(stored, _)| stored.clone())
    }

    pub fn ttl(&self, full_key: &str) -> Option<Duration> {
        self.entries
            .lock()
            .unwrap()
            .get(full_key)
            .and_then(|(_, ttl)| *ttl)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

impl Store for MapStore {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.raw(&self.prefixed(key)))
    }

    fn put_raw(&self, key: &str, stored: String, ttl: Option<Duration>) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(self.prefixed(key), (stored, ttl));
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<bool, Error> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .lock()
            .unwrap()
            .remove(&self.prefixed(key))
            .is_some())
    }

    fn flush(&self) -> Result<bool, Error> {
        self.entries.lock().unwrap().clear();
        Ok(true)
    }
}

#[cfg(feature = "tracing")]
static TRACING_INIT: std::sync::Once = std::sync::Once::new();

pub fn tracing_init() {
    #[cfg(feature = "tracing")]
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .init();
    });
}
