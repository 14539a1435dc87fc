//! Homenet WgConf - WireGuard config distribution
//!
//! Configs named `<host>-<name>.conf` are loaded from a directory at startup
//! and served over HTTP at `/<host>/<name>` to clients that present the
//! config's private key as their basic-auth password.

pub mod config;
pub mod error;
pub mod server;

pub use config::{load_configs, parse_config, ConfigStore, ParsedConfig};
pub use error::{Result, WgConfError};
pub use server::{create_router, AppState};
