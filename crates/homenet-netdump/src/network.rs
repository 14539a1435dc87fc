//! Subnet numbering within a parent network

use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::{NetdumpError, Result};
use crate::prefix::Prefix;

/// Every IPv6 subnet is a /64
pub const IPV6_NETWORK_BITS: u8 = 64;

/// Largest IPv4 parent that still leaves room for a child network
pub const IPV4_MAX_PARENT_BITS: u8 = 23;

/// Child subnet `id` of an IPv4 parent
///
/// The child length is the next multiple of 8 above the parent length, so a
/// /16 parent yields /24 children and a /20 parent yields sixteen /24s.
pub fn ipv4_network(parent: &Prefix, id: u64) -> Result<Prefix> {
    let parent = parent.masked();
    let network = parent.ipv4()?;
    if parent.bits() > IPV4_MAX_PARENT_BITS {
        return Err(NetdumpError::NetworkTooSmall { family: "ipv4" });
    }

    let child_bits = parent.bits() / 8 * 8 + 8;
    let id_bits = (child_bits - parent.bits()) as u32;
    if id >= 1u64 << id_bits {
        return Err(NetdumpError::IdTooLarge);
    }

    let addr = u32::from(network) + ((id as u32) << (32 - child_bits as u32));
    Prefix::new(IpAddr::V4(Ipv4Addr::from(addr)), child_bits)
}

/// Child /64 `id` of an IPv6 parent
pub fn ipv6_network(parent: &Prefix, id: u64) -> Result<Prefix> {
    let parent = parent.masked();
    let network = parent.ipv6()?;
    if parent.bits() >= IPV6_NETWORK_BITS {
        return Err(NetdumpError::NetworkTooSmall { family: "ipv6" });
    }

    let id_bits = (IPV6_NETWORK_BITS - parent.bits()) as u32;
    if (id as u128) >= 1u128 << id_bits {
        return Err(NetdumpError::IdTooLarge);
    }

    let addr = u128::from(network) + ((id as u128) << (128 - IPV6_NETWORK_BITS as u32));
    Prefix::new(IpAddr::V6(Ipv6Addr::from(addr)), IPV6_NETWORK_BITS)
}

/// Inputs for [`network_dump`]; absent parents are skipped
#[derive(Debug, Clone, Default)]
pub struct NetworkRequest {
    pub id: u64,
    pub ipv4_prefix: Option<Prefix>,
    pub ipv6_ula_prefix: Option<Prefix>,
    pub ipv6_gua_prefix: Option<Prefix>,
}

/// Subnets assigned to one network id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDump {
    pub ipv4_prefix: Option<Prefix>,
    pub ipv6_ula_prefix: Option<Prefix>,
    pub ipv6_gua_prefix: Option<Prefix>,
}

/// Derive the subnets of network `id` in every requested family
pub fn network_dump(req: &NetworkRequest) -> Result<NetworkDump> {
    Ok(NetworkDump {
        ipv4_prefix: req.ipv4_prefix.as_ref().map(|p| ipv4_network(p, req.id)).transpose()?,
        ipv6_ula_prefix: req.ipv6_ula_prefix.as_ref().map(|p| ipv6_network(p, req.id)).transpose()?,
        ipv6_gua_prefix: req.ipv6_gua_prefix.as_ref().map(|p| ipv6_network(p, req.id)).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(parent: &str, id: u64) -> Result<String> {
        ipv4_network(&parent.parse().unwrap(), id).map(|p| p.to_string())
    }

    fn v6(parent: &str, id: u64) -> Result<String> {
        ipv6_network(&parent.parse().unwrap(), id).map(|p| p.to_string())
    }

    #[test]
    fn test_ipv4_children() {
        assert_eq!(v4("10.0.0.0/16", 0).unwrap(), "10.0.0.0/24");
        assert_eq!(v4("10.0.0.0/16", 5).unwrap(), "10.0.5.0/24");
        assert_eq!(v4("10.0.0.0/16", 255).unwrap(), "10.0.255.0/24");
        assert_eq!(v4("172.16.0.0/20", 15).unwrap(), "172.16.15.0/24");
        assert_eq!(v4("10.0.0.0/8", 3).unwrap(), "10.3.0.0/16");
        // Host bits in the parent are ignored
        assert_eq!(v4("10.0.3.7/16", 1).unwrap(), "10.0.1.0/24");
    }

    #[test]
    fn test_ipv4_limits() {
        assert_eq!(v4("10.0.0.0/16", 256), Err(NetdumpError::IdTooLarge));
        assert_eq!(v4("172.16.0.0/20", 16), Err(NetdumpError::IdTooLarge));
        assert_eq!(
            v4("192.168.0.0/24", 0),
            Err(NetdumpError::NetworkTooSmall { family: "ipv4" })
        );
    }

    #[test]
    fn test_ipv6_children() {
        assert_eq!(v6("fd00:1:2::/48", 1).unwrap(), "fd00:1:2:1::/64");
        assert_eq!(v6("fd00:1:2::/48", 0xffff).unwrap(), "fd00:1:2:ffff::/64");
        assert_eq!(v6("fd00:0:0:10::/60", 15).unwrap(), "fd00:0:0:1f::/64");
        assert_eq!(v6("2001:db8::/32", 0x10001).unwrap(), "2001:db8:1:1::/64");
    }

    #[test]
    fn test_ipv6_limits() {
        assert_eq!(v6("fd00:1:2::/48", 0x10000), Err(NetdumpError::IdTooLarge));
        assert_eq!(
            v6("fd00::/64", 0),
            Err(NetdumpError::NetworkTooSmall { family: "ipv6" })
        );
        assert!(v6("::/0", u64::MAX).is_ok());
    }

    #[test]
    fn test_family_mismatch() {
        assert!(matches!(v4("fd00::/48", 1), Err(NetdumpError::AddressFamily { .. })));
        assert!(matches!(v6("10.0.0.0/8", 1), Err(NetdumpError::AddressFamily { .. })));
    }

    #[test]
    fn test_network_dump_skips_missing_families() {
        let dump = network_dump(&NetworkRequest {
            id: 2,
            ipv4_prefix: Some("192.168.0.0/16".parse().unwrap()),
            ipv6_ula_prefix: Some("fd00:aa::/48".parse().unwrap()),
            ipv6_gua_prefix: None,
        })
        .unwrap();

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ipv4Prefix": "192.168.2.0/24",
                "ipv6UlaPrefix": "fd00:aa:0:2::/64",
                "ipv6GuaPrefix": null
            })
        );
    }
}
