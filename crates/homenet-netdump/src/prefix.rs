//! IP prefixes and MAC addresses

use serde::{Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::{NetdumpError, Result};

/// An address with a prefix length, e.g. `192.168.0.1/24`
///
/// Host bits are kept as written; call [`Prefix::masked`] to clear them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    addr: IpAddr,
    len: u8,
}

impl Prefix {
    pub fn new(addr: IpAddr, len: u8) -> Result<Self> {
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if len > max {
            return Err(NetdumpError::InvalidPrefix(format!("{}/{}", addr, len)));
        }
        Ok(Self { addr, len })
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Prefix length in bits
    pub fn bits(&self) -> u8 {
        self.len
    }

    /// The same prefix with all host bits cleared
    pub fn masked(&self) -> Self {
        let addr = match self.addr {
            IpAddr::V4(v4) => {
                let mask = u32::MAX.checked_shl(32 - self.len as u32).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & mask))
            }
            IpAddr::V6(v6) => {
                let mask = u128::MAX.checked_shl(128 - self.len as u32).unwrap_or(0);
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) & mask))
            }
        };
        Self { addr, len: self.len }
    }

    pub fn ipv4(&self) -> Result<Ipv4Addr> {
        match self.addr {
            IpAddr::V4(v4) => Ok(v4),
            IpAddr::V6(_) => Err(NetdumpError::AddressFamily {
                prefix: self.to_string(),
                expected: "IPv4",
            }),
        }
    }

    pub fn ipv6(&self) -> Result<Ipv6Addr> {
        match self.addr {
            IpAddr::V6(v6) => Ok(v6),
            IpAddr::V4(_) => Err(NetdumpError::AddressFamily {
                prefix: self.to_string(),
                expected: "IPv6",
            }),
        }
    }
}

impl FromStr for Prefix {
    type Err = NetdumpError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || NetdumpError::InvalidPrefix(s.to_string());
        let (addr, len) = s.split_once('/').ok_or_else(invalid)?;
        if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
        let len: u8 = len.parse().map_err(|_| invalid())?;
        Prefix::new(addr, len).map_err(|_| invalid())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl Serialize for Prefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A 48-bit MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Modified EUI-64 interface identifier (RFC 4291 appendix A)
    pub fn eui64(&self) -> [u8; 8] {
        let m = self.0;
        [m[0] ^ 0b10, m[1], m[2], 0xff, 0xfe, m[3], m[4], m[5]]
    }
}

impl FromStr for MacAddr {
    type Err = NetdumpError;

    /// Accepts `00:11:22:33:44:55`, `00-11-22-33-44-55` and `0011.2233.4455`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || NetdumpError::InvalidMac(s.to_string());

        let hex: String = if s.contains('.') {
            let groups: Vec<&str> = s.split('.').collect();
            if groups.len() != 3 || groups.iter().any(|g| g.len() != 4) {
                return Err(invalid());
            }
            groups.concat()
        } else {
            let sep = if s.contains('-') { '-' } else { ':' };
            let groups: Vec<&str> = s.split(sep).collect();
            if groups.len() != 6 || groups.iter().any(|g| g.len() != 2) {
                return Err(invalid());
            }
            groups.concat()
        };

        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(MacAddr(bytes))
    }
}
