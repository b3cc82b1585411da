//! Value bounds of the generic [`Store`](crate::Store) methods.
//!
//! With the `tracing` feature, values written and read are recorded in span
//! fields and must be `Debug` as well.

use serde::{Serialize, de::DeserializeOwned};

/// Anything `put` can encode.
#[cfg(feature = "tracing")]
pub trait Storable: Serialize + std::fmt::Debug {}

#[cfg(feature = "tracing")]
impl<T> Storable for T where T: Serialize + std::fmt::Debug + ?Sized {}

#[cfg(not(feature = "tracing"))]
pub trait Storable: Serialize {}

#[cfg(not(feature = "tracing"))]
impl<T> Storable for T where T: Serialize + ?Sized {}

/// Anything `get_struct` can decode.
#[cfg(feature = "tracing")]
pub trait Loadable: DeserializeOwned + std::fmt::Debug {}

#[cfg(feature = "tracing")]
impl<T> Loadable for T where T: DeserializeOwned + std::fmt::Debug {}

#[cfg(not(feature = "tracing"))]
pub trait Loadable: DeserializeOwned {}

#[cfg(not(feature = "tracing"))]
impl<T> Loadable for T where T: DeserializeOwned {}
