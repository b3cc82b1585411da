use std::{sync::Mutex, time::Duration};

use cache::{
    ConfigurationError, Connector, ConnectorConfig, Error, Store, increment_in_place,
};
use redis::{ErrorKind, FromRedisValue, IntoConnectionInfo, RedisResult};

/// [`Store`] on a Redis database.
///
/// The connection is opened on first use and reopened after an I/O failure.
/// `flush` runs `FLUSHDB`, so it clears the whole selected database, not only
/// this store's prefix.
pub struct RedisCache {
    client: redis::Client,
    connection: Mutex<Option<redis::Connection>>,
    prefix: String,
}

impl RedisCache {
    pub fn new(client: redis::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            connection: Mutex::new(None),
            prefix: prefix.into(),
        }
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut redis::Connection) -> RedisResult<T>,
    ) -> Result<RedisResult<T>, Error> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| Error::backend("redis connection lock poisoned"))?;

        let connection = match guard.take() {
            Some(connection) => connection,
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("opening redis connection");

                self.client.get_connection().map_err(Error::backend)?
            }
        };

        let result = f(guard.insert(connection));

        if let Err(err) = &result {
            if err.is_io_error() || err.is_connection_dropped() {
                #[cfg(feature = "tracing")]
                tracing::debug!("dropping broken redis connection :: {}", err);

                *guard = None;
            }
        }

        Ok(result)
    }

    fn query<T>(&self, cmd: &redis::Cmd) -> Result<T, Error>
    where
        T: FromRedisValue,
    {
        self.with_connection(|connection| cmd.query::<T>(connection))?
            .map_err(Error::backend)
    }
}

impl Store for RedisCache {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        self.query(redis::cmd("GET").arg(self.prefixed(key)))
    }

    fn put_raw(&self, key: &str, stored: String, ttl: Option<Duration>) -> Result<(), Error> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.prefixed(key)).arg(stored);

        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }

        self.query(&cmd)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?key), skip_all, ret)
    )]
    fn forget(&self, key: &str) -> Result<bool, Error> {
        let removed: i64 = self.query(redis::cmd("DEL").arg(self.prefixed(key)))?;
        Ok(removed > 0)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, ret)
    )]
    fn flush(&self) -> Result<bool, Error> {
        self.query::<()>(&redis::cmd("FLUSHDB"))?;
        Ok(true)
    }

    /// `INCRBY`, atomic on the server. Stored floats and non-numeric values
    /// are rejected by Redis and handled by the read-modify-write fallback.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", fields(?key, ?delta), skip_all, ret)
    )]
    fn increment(&self, key: &str, delta: i64) -> Result<i64, Error> {
        let prefixed = self.prefixed(key);

        let result = self.with_connection(|connection| {
            redis::cmd("INCRBY")
                .arg(&prefixed)
                .arg(delta)
                .query::<i64>(connection)
        })?;

        match result {
            Ok(next) => Ok(next),
            Err(err) if matches!(err.kind(), ErrorKind::ResponseError | ErrorKind::TypeError) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("INCRBY rejected, falling back :: {}", err);

                increment_in_place(self, key, delta)
            }
            Err(err) => Err(Error::backend(err)),
        }
    }
}

/// Builds a [`RedisCache`] from `address`, `database`, `password` and
/// `prefix`. No connection is opened here.
pub struct RedisConnector;

impl Connector for RedisConnector {
    type Store = RedisCache;

    fn connect(&self, config: &ConnectorConfig) -> Result<Self::Store, ConfigurationError> {
        let address = config.require(
            "address",
            "specify an address for your redis server, e.g. `localhost:6379`",
        )?;
        let database = config.require_parsed::<u16>(
            "database",
            "specify a database index for your redis server, e.g. `0`",
        )?;
        let password = config.require(
            "password",
            "specify a password for your redis server (empty for none)",
        )?;
        let prefix = config.require("prefix", "specify a caching prefix, e.g. `app:`")?;

        let invalid_address = |e: redis::RedisError| ConfigurationError::Invalid {
            key: "address",
            reason: e.to_string(),
        };

        let mut info = format!("redis://{}", address)
            .into_connection_info()
            .map_err(invalid_address)?;
        info.redis.db = i64::from(database);
        info.redis.password = (!password.is_empty()).then(|| password.to_string());

        let client = redis::Client::open(info).map_err(invalid_address)?;

        Ok(RedisCache::new(client, prefix))
    }
}
