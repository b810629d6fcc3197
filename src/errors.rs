use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Outcome of a failed remote lookup.
///
/// None of these are ever cached: the next lookup for the same query
/// goes to the resolver again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No profile found for {0}")]
    NotFound(String),
    #[error("Identity service unreachable: {0}")]
    Unreachable(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ResolveError {
    /// `true` when the service answered and the identity does not exist,
    /// as opposed to the lookup itself having failed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache file of {0} is corrupt: {1}")]
    PersistenceCorrupt(String, String),
    #[error("Failed to write cache file of {0}: {1}")]
    PersistenceWriteFailure(String, String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::PersistenceCorrupt("json".to_owned(), e.to_string())
    }
}

impl From<toml::de::Error> for CacheError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<url::ParseError> for CacheError {
    fn from(e: url::ParseError) -> Self {
        Self::Config(e.to_string())
    }
}
