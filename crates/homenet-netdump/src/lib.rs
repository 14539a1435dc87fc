//! Homenet Netdump - address plan for statically numbered hosts and subnets
//!
//! Given a host id (and optionally its MAC) this derives the IPv4, IPv6 ULA
//! and IPv6 GUA addresses the host is configured with. Given a network id it
//! derives the child subnets carved out of larger parent prefixes.
//!
//! # Example
//!
//! ```rust
//! use homenet_netdump::{host_dump, HostRequest, DEFAULT_MAX_STATIC_HOST_ID};
//!
//! let dump = host_dump(&HostRequest {
//!     id: 1,
//!     max_static_host_id: DEFAULT_MAX_STATIC_HOST_ID,
//!     mac: None,
//!     ipv6_gua_prefix: None,
//!     ipv6_ula_prefix: "fc00::/64".parse().unwrap(),
//!     ipv4_prefix: "192.168.0.0/24".parse().unwrap(),
//! })
//! .unwrap();
//! assert_eq!(dump.ipv4.to_string(), "192.168.0.1");
//! ```

pub mod error;
pub mod host;
pub mod network;
pub mod prefix;

pub use error::{NetdumpError, Result};
pub use host::{
    host_dump, host_v4, host_v6, host_v6_from_mac, HostDump, HostRequest,
    DEFAULT_MAX_STATIC_HOST_ID,
};
pub use network::{ipv4_network, ipv6_network, network_dump, NetworkDump, NetworkRequest};
pub use prefix::{MacAddr, Prefix};
