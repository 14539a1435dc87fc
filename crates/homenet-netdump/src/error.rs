//! Address derivation errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetdumpError {
    /// Host or network id does not fit in the available space
    #[error("network/host ID too large")]
    IdTooLarge,

    /// Host id outside `1..=max_static_host_id`
    #[error("invalid host ID")]
    InvalidId,

    /// Parent network leaves no room for child subnets
    #[error("{family} network too small")]
    NetworkTooSmall { family: &'static str },

    /// Malformed `addr/len` prefix
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Prefix of the wrong address family
    #[error("expected an {expected} prefix, got {prefix}")]
    AddressFamily { prefix: String, expected: &'static str },

    /// Malformed MAC address
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
}

/// Result type for address derivation
pub type Result<T> = std::result::Result<T, NetdumpError>;
