mod bounds;
pub mod codec;
mod config;
mod error;
mod store;
mod tag;
mod tagged;
mod value;

pub use bounds::{Loadable, Storable};
pub use config::{ConfigurationError, Connector, ConnectorConfig};
pub use error::{BoxError, Error};
pub use store::{Store, increment_in_place, ttl_from_minutes};
pub use tag::TagSet;
pub use tagged::TaggedCache;
pub use value::Value;
