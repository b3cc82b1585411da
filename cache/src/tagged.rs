use std::time::Duration;

use crate::{Error, Store, TagSet};

/// A [`Store`] view whose keys embed the current versions of its tags.
///
/// Every key is rewritten to `{key}:{tag_key}` before it reaches the
/// underlying store. `flush` bumps the tag versions instead of deleting
/// anything, which orphans every entry written under the previous versions.
/// A `put` racing a `flush` may land under an orphaned key.
pub struct TaggedCache<'a, S> {
    store: &'a S,
    tags: TagSet<'a, S>,
}

impl<'a, S> TaggedCache<'a, S>
where
    S: Store,
{
    pub fn new(store: &'a S, tags: TagSet<'a, S>) -> Self {
        Self { store, tags }
    }

    pub fn tag_set(&self) -> &TagSet<'a, S> {
        &self.tags
    }

    pub fn tagged_key(&self, key: &str) -> Result<String, Error> {
        Ok(format!("{}:{}", key, self.tags.tag_key()?))
    }
}

impl<S> Store for TaggedCache<'_, S>
where
    S: Store,
{
    fn prefix(&self) -> &str {
        self.store.prefix()
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        self.store.get_raw(&self.tagged_key(key)?)
    }

    fn put_raw(&self, key: &str, stored: String, ttl: Option<Duration>) -> Result<(), Error> {
        self.store.put_raw(&self.tagged_key(key)?, stored, ttl)
    }

    fn forget(&self, key: &str) -> Result<bool, Error> {
        self.store.forget(&self.tagged_key(key)?)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(names = ?self.tags.names()), skip_all, ret)
    )]
    fn flush(&self) -> Result<bool, Error> {
        self.tags.reset()?;
        Ok(true)
    }

    fn increment(&self, key: &str, delta: i64) -> Result<i64, Error> {
        self.store.increment(&self.tagged_key(key)?, delta)
    }
}
