pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid numeric value for key `{key}`")]
    InvalidNumericValue { key: String },

    #[error("cannot decode value stored under `{key}` :: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode value :: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("backend :: {0}")]
    Backend(#[source] BoxError),
}

impl Error {
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }

    pub(crate) fn invalid_numeric(key: &str) -> Self {
        Self::InvalidNumericValue {
            key: key.to_string(),
        }
    }

    pub(crate) fn decode(key: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            key: key.to_string(),
            source,
        }
    }
}
