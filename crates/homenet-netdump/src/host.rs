//! Static host addressing
//!
//! Hosts with a static id get the same address in every family: the id is
//! added to the low bytes of the network address. A MAC, when known, switches
//! the ULA address to an EUI-64 interface identifier instead.

use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

use crate::error::{NetdumpError, Result};
use crate::prefix::{MacAddr, Prefix};

/// Half of a /24: ids above this are left to DHCP pools
pub const DEFAULT_MAX_STATIC_HOST_ID: i64 = (1 << 7) - 1;

/// Inputs for [`host_dump`]
#[derive(Debug, Clone)]
pub struct HostRequest {
    pub id: i64,
    pub max_static_host_id: i64,
    pub mac: Option<MacAddr>,
    pub ipv6_gua_prefix: Option<Prefix>,
    pub ipv6_ula_prefix: Prefix,
    pub ipv4_prefix: Prefix,
}

/// Addresses assigned to one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDump {
    pub ipv4: Ipv4Addr,
    pub ipv4_cidr: Prefix,
    pub ipv6_ula: Ipv6Addr,
    pub ipv6_ula_cidr: Prefix,
    pub ipv6_gua: Option<Ipv6Addr>,
    pub ipv6_gua_cidr: Option<Prefix>,
}

/// Add the big-endian id bytes to the last four octets, byte by byte
///
/// Each octet wraps on its own; no carry crosses octet boundaries.
fn add_host_id(octets: &mut [u8], id: u32) {
    let offset = octets.len() - 4;
    for (octet, b) in octets[offset..].iter_mut().zip(id.to_be_bytes()) {
        *octet = octet.wrapping_add(b);
    }
}

/// IPv4 host address for `id` within `prefix`
///
/// The network and broadcast addresses are reserved, so at most
/// `2^(32 - bits) - 2` ids fit.
pub fn host_v4(prefix: &Prefix, id: u32) -> Result<(Ipv4Addr, Prefix)> {
    let network = prefix.ipv4()?;
    let available = (1i64 << (32 - prefix.bits() as u32)) - 2;
    if id as i64 > available {
        return Err(NetdumpError::IdTooLarge);
    }

    let mut octets = network.octets();
    add_host_id(&mut octets, id);
    let addr = Ipv4Addr::from(octets);
    Ok((addr, Prefix::new(IpAddr::V4(addr), prefix.bits())?))
}

/// IPv6 host address for `id` within `prefix`
pub fn host_v6(prefix: &Prefix, id: u32) -> Result<(Ipv6Addr, Prefix)> {
    let mut octets = prefix.ipv6()?.octets();
    add_host_id(&mut octets, id);
    let addr = Ipv6Addr::from(octets);
    Ok((addr, Prefix::new(IpAddr::V6(addr), prefix.bits())?))
}

/// IPv6 SLAAC-style address: network bits from `prefix`, EUI-64 from `mac`
pub fn host_v6_from_mac(prefix: &Prefix, mac: &MacAddr) -> Result<(Ipv6Addr, Prefix)> {
    let mut octets = prefix.ipv6()?.octets();
    octets[8..].copy_from_slice(&mac.eui64());
    let addr = Ipv6Addr::from(octets);
    Ok((addr, Prefix::new(IpAddr::V6(addr), prefix.bits())?))
}

/// Derive every address of a static host
pub fn host_dump(req: &HostRequest) -> Result<HostDump> {
    if req.id <= 0 || req.id > req.max_static_host_id {
        return Err(NetdumpError::InvalidId);
    }
    let id = u32::try_from(req.id).map_err(|_| NetdumpError::IdTooLarge)?;

    let (ipv6_ula, ipv6_ula_cidr) = match &req.mac {
        Some(mac) => host_v6_from_mac(&req.ipv6_ula_prefix, mac)?,
        None => host_v6(&req.ipv6_ula_prefix, id)?,
    };

    let (ipv6_gua, ipv6_gua_cidr) = match &req.ipv6_gua_prefix {
        Some(prefix) => {
            let (addr, cidr) = host_v6(prefix, id)?;
            (Some(addr), Some(cidr))
        }
        None => (None, None),
    };

    let (ipv4, ipv4_cidr) = host_v4(&req.ipv4_prefix, id)?;

    debug!("host {} -> {} / {}", id, ipv4, ipv6_ula);

    Ok(HostDump {
        ipv4,
        ipv4_cidr,
        ipv6_ula,
        ipv6_ula_cidr,
        ipv6_gua,
        ipv6_gua_cidr,
    })
}
