use anyhow::Context;
use cache::{Connector, ConnectorConfig, Store, Value};
use clap::{Parser, Subcommand};
use rediscache::RedisConnector;

#[derive(Parser)]
struct Args {
    #[command(flatten)]
    connection: Connection,

    /// Scope the command to these tags. Repeat the flag for several tags.
    /// `flush` with tags invalidates the tags instead of clearing the database.
    /// Example: `--tag users --tag admins`
    #[arg(long = "tag", global = true)]
    tags: Vec<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Args)]
struct Connection {
    /// The address of the redis server.
    /// Example: `localhost:6379`
    #[arg(long, env = "REDIS_ADDRESS", default_value = "localhost:6379")]
    address: String,

    /// The redis database index.
    /// Example: `0`
    #[arg(long, env = "REDIS_DATABASE", default_value_t = 0)]
    database: u16,

    /// The password for the redis server. Empty for none.
    /// This should be kept secure and **not logged**.
    #[arg(long, env = "REDIS_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Prefix prepended to every key.
    /// Example: `app:`
    #[arg(long, env = "CACHE_PREFIX", default_value = "")]
    prefix: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the value stored under a key.
    Get { key: String },

    /// Print several keys at once.
    Many { keys: Vec<String> },

    /// Store a value. JSON is stored as structured data, anything else as text.
    Put {
        key: String,
        value: String,

        /// Expiry in minutes. `0` stores the value without expiry.
        #[arg(long, default_value_t = 0)]
        minutes: u64,
    },

    /// Store a value without expiry.
    Forever { key: String, value: String },

    /// Add to a counter and print the new value.
    Increment {
        key: String,
        #[arg(default_value_t = 1)]
        by: i64,
    },

    /// Subtract from a counter and print the new value.
    Decrement {
        key: String,
        #[arg(default_value_t = 1)]
        by: i64,
    },

    /// Delete a key.
    Forget { key: String },

    /// Clear the database, or invalidate the tags given with `--tag`.
    Flush,
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::Text(raw.to_string()))
}

fn show(value: Option<&Value>) -> String {
    value.map_or_else(|| "(absent)".to_string(), Value::to_string)
}

fn run<S>(store: &S, cmd: Command) -> anyhow::Result<()>
where
    S: Store,
{
    match cmd {
        Command::Get { key } => {
            let value = store.get(&key).context(format!("get :: {}", key))?;
            println!("{}", show(value.as_ref()));
        }
        Command::Many { keys } => {
            let values = store.many(&keys).context("many")?;
            for key in &keys {
                println!("{} = {}", key, show(values.get(key).and_then(Option::as_ref)));
            }
        }
        Command::Put {
            key,
            value,
            minutes,
        } => {
            store
                .put(&key, &parse_value(&value), minutes)
                .context(format!("put :: {}", key))?;
        }
        Command::Forever { key, value } => {
            store
                .forever(&key, &parse_value(&value))
                .context(format!("forever :: {}", key))?;
        }
        Command::Increment { key, by } => {
            let value = store
                .increment(&key, by)
                .context(format!("increment :: {}", key))?;
            println!("{}", value);
        }
        Command::Decrement { key, by } => {
            let value = store
                .decrement(&key, by)
                .context(format!("decrement :: {}", key))?;
            println!("{}", value);
        }
        Command::Forget { key } => {
            let existed = store.forget(&key).context(format!("forget :: {}", key))?;
            println!("{}", existed);
        }
        Command::Flush => {
            let flushed = store.flush().context("flush")?;
            println!("{}", flushed);
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Args {
        connection,
        tags,
        cmd,
    } = Args::parse();

    tracing::info!(
        address = %connection.address,
        database = connection.database,
        prefix = %connection.prefix
    );

    let config = ConnectorConfig::new()
        .with("address", connection.address)
        .with("database", connection.database.to_string())
        .with("password", connection.password)
        .with("prefix", connection.prefix);

    let store = RedisConnector
        .connect(&config)
        .context("connect redis store")?;

    match tags.is_empty() {
        true => run(&store, cmd),
        false => run(&store.tags(tags), cmd),
    }
}
