use std::{collections::HashMap, fmt::Display, str::FromStr};

use crate::Store;

/// Builds a [`Store`] from connector parameters. Every required parameter is
/// checked before the store exists.
pub trait Connector {
    type Store: Store;

    fn connect(&self, config: &ConnectorConfig) -> Result<Self::Store, ConfigurationError>;
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("missing `{key}` :: {hint}")]
    Missing {
        key: &'static str,
        hint: &'static str,
    },

    #[error("invalid `{key}` :: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConnectorConfig {
    params: HashMap<String, String>,
}

impl ConnectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn require(
        &self,
        key: &'static str,
        hint: &'static str,
    ) -> Result<&str, ConfigurationError> {
        self.get(key).ok_or(ConfigurationError::Missing { key, hint })
    }

    pub fn require_parsed<T>(
        &self,
        key: &'static str,
        hint: &'static str,
    ) -> Result<T, ConfigurationError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.require(key, hint)?
            .parse::<T>()
            .map_err(|e| ConfigurationError::Invalid {
                key,
                reason: format!("cannot parse as {} :: {}", std::any::type_name::<T>(), e),
            })
    }
}

impl<K, V> FromIterator<(K, V)> for ConnectorConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
