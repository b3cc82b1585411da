use crate::{Error, Store};

/// Current version tokens of a set of tag names.
///
/// Versions live in the tagged store itself under `tag:{name}:key`, so they
/// survive restarts exactly like ordinary entries. Resetting a tag only
/// replaces its token; entries written under the old token are left to the
/// backend's own eviction.
///
/// `tag:{name}:key` is reserved: plain keys of that shape share the slot.
pub struct TagSet<'a, S> {
    store: &'a S,
    names: Vec<String>,
}

impl<'a, S> TagSet<'a, S>
where
    S: Store,
{
    pub fn new<I, N>(store: &'a S, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        Self {
            store,
            names: unique,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Current token for `name`, created and persisted on first use.
    ///
    /// A version slot holding something other than a token (a caller wrote
    /// to `tag:{name}:key` directly) counts as a reset: a new token replaces
    /// it and earlier entries under the tag become unreachable.
    pub fn tag_id(&self, name: &str) -> Result<String, Error> {
        match self.store.get_struct::<String>(&tag_store_key(name)) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => self.reset_tag(name),
            Err(Error::Decode { .. }) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("tag `{}` has a foreign version slot, resetting", name);

                self.reset_tag(name)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?name), skip_all, ret)
    )]
    pub fn reset_tag(&self, name: &str) -> Result<String, Error> {
        let id = new_tag_id();
        self.store.forever(&tag_store_key(name), &id)?;
        Ok(id)
    }

    /// One write per name, however many entries were tagged.
    pub fn reset(&self) -> Result<(), Error> {
        for name in &self.names {
            self.reset_tag(name)?;
        }
        Ok(())
    }

    pub fn tag_ids(&self) -> Result<Vec<String>, Error> {
        self.names.iter().map(|name| self.tag_id(name)).collect()
    }

    /// Sorted current tokens joined with `|`; independent of name order.
    pub fn tag_key(&self) -> Result<String, Error> {
        let mut ids = self.tag_ids()?;
        ids.sort();
        Ok(ids.join("|"))
    }
}

fn tag_store_key(name: &str) -> String {
    format!("tag:{}:key", name)
}

fn new_tag_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}
