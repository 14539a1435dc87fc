//! Error types for config parsing and loading

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WgConfError {
    /// Config is empty or carries no private key
    #[error("invalid config")]
    InvalidConfig,

    /// Reading a config, key file or directory failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for config operations
pub type Result<T> = std::result::Result<T, WgConfError>;
