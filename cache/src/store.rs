use std::{collections::HashMap, time::Duration};

use crate::{
    Error, TagSet, TaggedCache, Value,
    bounds::{Loadable, Storable},
    codec,
};

/// Uniform cache contract.
///
/// Backends implement the string level methods (`prefix`, `get_raw`,
/// `put_raw`, `forget`, `flush`) and get value coercion, counters, bulk
/// operations and tagging on top of them. Absence of a key is never an
/// error: readers return `None`.
///
/// Keys passed to the string level methods are caller keys. Implementations
/// store them under [`Store::prefixed`].
pub trait Store {
    fn prefix(&self) -> &str;

    fn get_raw(&self, key: &str) -> Result<Option<String>, Error>;

    /// `ttl` of `None` means no expiry managed by this layer.
    fn put_raw(&self, key: &str, stored: String, ttl: Option<Duration>) -> Result<(), Error>;

    /// Returns whether the key was present.
    fn forget(&self, key: &str) -> Result<bool, Error>;

    /// Clears every key owned by this store. Whether that reaches past
    /// `prefix` is up to the backend.
    fn flush(&self) -> Result<bool, Error>;

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix(), key)
    }

    /// Adds `delta` to the truncated integer stored under `key`.
    ///
    /// An absent or non-numeric key is (re)set to `delta`. A stored number
    /// outside the i64 range is an error and stays as it is. The default is a
    /// plain read-modify-write and loses updates under concurrent callers;
    /// backends with an atomic counter primitive override it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?key, ?delta), skip_all, ret)
    )]
    fn increment(&self, key: &str, delta: i64) -> Result<i64, Error> {
        increment_in_place(self, key, delta)
    }

    fn decrement(&self, key: &str, delta: i64) -> Result<i64, Error> {
        let delta = delta
            .checked_neg()
            .ok_or_else(|| Error::invalid_numeric(key))?;
        self.increment(key, delta)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?key), skip_all, ret)
    )]
    fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        match self.get_raw(key)? {
            Some(stored) => Value::from_stored(&stored)
                .map(Some)
                .map_err(|e| Error::decode(key, e)),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("key not found");

                Ok(None)
            }
        }
    }

    fn get_float(&self, key: &str) -> Result<f64, Error> {
        self.get_raw(key)?
            .as_deref()
            .and_then(codec::number)
            .and_then(|number| number.as_f64())
            .ok_or_else(|| Error::invalid_numeric(key))
    }

    fn get_int(&self, key: &str) -> Result<i64, Error> {
        self.get_raw(key)?
            .as_deref()
            .and_then(codec::truncated)
            .and_then(Result::ok)
            .ok_or_else(|| Error::invalid_numeric(key))
    }

    /// Decodes the stored value as `T`, even when it looks like a number.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?key), skip_all, ret)
    )]
    fn get_struct<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        Self: Sized,
        T: Loadable,
    {
        self.get_raw(key)?
            .map(|stored| codec::decode(&stored).map_err(|e| Error::decode(key, e)))
            .transpose()
    }

    /// Stores `value` for `minutes`; `0` stores it without expiry.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?key, ?value, ?minutes), skip_all)
    )]
    fn put<T>(&self, key: &str, value: &T, minutes: u64) -> Result<(), Error>
    where
        Self: Sized,
        T: Storable + ?Sized,
    {
        let stored = codec::encode(value).map_err(Error::Encode)?;
        self.put_raw(key, stored, ttl_from_minutes(minutes))
    }

    fn forever<T>(&self, key: &str, value: &T) -> Result<(), Error>
    where
        Self: Sized,
        T: Storable + ?Sized,
    {
        self.put(key, value, 0)
    }

    /// Attempts every entry and returns the first error afterwards. Entries
    /// written before or after a failing one stay written.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?minutes), skip_all)
    )]
    fn put_many<I, K, V>(&self, values: I, minutes: u64) -> Result<(), Error>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Storable,
    {
        let mut first_err = None;

        for (key, value) in values {
            if let Err(err) = self.put(key.as_ref(), &value, minutes) {
                #[cfg(feature = "tracing")]
                tracing::debug!("failed to put `{}` :: {}", key.as_ref(), err);

                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// One entry per requested key, `None` for absent ones. Stops at the
    /// first error.
    fn many<K>(&self, keys: &[K]) -> Result<HashMap<String, Option<Value>>, Error>
    where
        Self: Sized,
        K: AsRef<str>,
    {
        keys.iter()
            .map(|key| Ok((key.as_ref().to_string(), self.get(key.as_ref())?)))
            .collect()
    }

    /// Scopes this store to `names`. Flushing the returned cache invalidates
    /// everything written through any scope over the same tags.
    ///
    /// Tag versions live in this store under `tag:{name}:key`; writing such
    /// keys directly invalidates the tag.
    fn tags<I, N>(&self, names: I) -> TaggedCache<'_, Self>
    where
        Self: Sized,
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        TaggedCache::new(self, TagSet::new(self, names))
    }
}

/// Read-modify-write counter update shared by [`Store::increment`] and
/// backends that fall back to it.
pub fn increment_in_place<S>(store: &S, key: &str, delta: i64) -> Result<i64, Error>
where
    S: Store + ?Sized,
{
    // an out of range number is left untouched
    let current = store
        .get_raw(key)?
        .as_deref()
        .and_then(codec::truncated)
        .transpose()
        .map_err(|_| Error::invalid_numeric(key))?;

    let next = match current {
        Some(current) => current
            .checked_add(delta)
            .ok_or_else(|| Error::invalid_numeric(key))?,
        None => delta,
    };

    store.put_raw(key, next.to_string(), None)?;
    Ok(next)
}

pub fn ttl_from_minutes(minutes: u64) -> Option<Duration> {
    (minutes > 0).then(|| Duration::from_secs(minutes.saturating_mul(60)))
}
