//! Error types shared by the store, the controllers and the command layer.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between a user intent and the disk.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-side input problem. Raised before the store is touched.
    #[error("{0}")]
    Validation(String),

    /// An insert collided with a live row while the conflict policy is `abort`.
    #[error("task {id} already exists")]
    Constraint { id: u64 },

    /// The backing file could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The backing file exists but does not hold a task table.
    #[error("storage is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    /// A config key parsed but holds an unusable value.
    #[error("invalid config value for `{key}`: {value:?}")]
    Setting { key: &'static str, value: String },
}

impl Error {
    /// True for failures of the persistence layer itself.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Corrupt(_))
    }
}
