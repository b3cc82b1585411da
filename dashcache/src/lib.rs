use std::time::{Duration, Instant};

use cache::{ConfigurationError, Connector, ConnectorConfig, Error, Store, codec};
use dashmap::DashMap;

struct Entry {
    stored: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(stored: String, ttl: Option<Duration>) -> Self {
        Self {
            stored,
            // a ttl too large for `Instant` never expires
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// In-memory [`Store`] backed by a [`DashMap`].
///
/// Expired entries read as absent and are dropped lazily on access, or all
/// at once with [`DashCache::purge_expired`]. `flush` clears the whole map,
/// including keys written under other prefixes through the same instance.
pub struct DashCache {
    entries: DashMap<String, Entry>,
    prefix: String,
}

impl DashCache {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            entries: DashMap::new(),
            prefix: prefix.into(),
        }
    }

    /// Number of live (unexpired) entries, tag versions included.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, ret)
    )]
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;

        self.entries.retain(|_, entry| match entry.is_expired(now) {
            true => {
                purged += 1;
                false
            }
            false => true,
        });

        purged
    }
}

impl Default for DashCache {
    fn default() -> Self {
        Self::new("")
    }
}

impl Store for DashCache {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        let key = self.prefixed(key);
        let now = Instant::now();

        let expired = match self.entries.get(&key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.stored.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            #[cfg(feature = "tracing")]
            tracing::debug!("dropping expired `{}`", key);

            self.entries.remove_if(&key, |_, entry| entry.is_expired(now));
        }

        Ok(None)
    }

    fn put_raw(&self, key: &str, stored: String, ttl: Option<Duration>) -> Result<(), Error> {
        self.entries.insert(self.prefixed(key), Entry::new(stored, ttl));
        Ok(())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?key), skip_all, ret)
    )]
    fn forget(&self, key: &str) -> Result<bool, Error> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(&self.prefixed(key))
            .is_some_and(|(_, entry)| !entry.is_expired(now)))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, ret)
    )]
    fn flush(&self) -> Result<bool, Error> {
        self.entries.clear();
        Ok(true)
    }

    /// Atomic per key: the read and the write happen under the map's entry
    /// lock. An existing expiry is kept.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?key, ?delta), skip_all, ret)
    )]
    fn increment(&self, key: &str, delta: i64) -> Result<i64, Error> {
        let now = Instant::now();

        match self.entries.entry(self.prefixed(key)) {
            dashmap::Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();

                let current = match entry.is_expired(now) {
                    true => {
                        entry.expires_at = None;
                        None
                    }
                    false => codec::truncated(&entry.stored)
                        .transpose()
                        .map_err(|_| Error::InvalidNumericValue {
                            key: key.to_string(),
                        })?,
                };

                let next = match current {
                    Some(current) => {
                        current
                            .checked_add(delta)
                            .ok_or_else(|| Error::InvalidNumericValue {
                                key: key.to_string(),
                            })?
                    }
                    None => delta,
                };

                entry.stored = next.to_string();
                Ok(next)
            }
            dashmap::Entry::Vacant(vacant) => {
                vacant.insert(Entry::new(delta.to_string(), None));
                Ok(delta)
            }
        }
    }
}

/// Builds a [`DashCache`]. Requires `prefix`.
pub struct DashConnector;

impl Connector for DashConnector {
    type Store = DashCache;

    fn connect(&self, config: &ConnectorConfig) -> Result<Self::Store, ConfigurationError> {
        let prefix = config.require("prefix", "specify a caching prefix, e.g. `app:`")?;
        Ok(DashCache::new(prefix))
    }
}
