//! Common error types for memos-import

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for memos-import operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading shared configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the expected schema
    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
