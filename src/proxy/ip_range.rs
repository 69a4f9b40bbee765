//! IP address ranges for proxy trust lists
//!
//! Supports single addresses, CIDR notation (`10.0.0.0/8`), netmask notation
//! (`10.0.0.0/255.0.0.0`) and the named aliases `loopback`, `linklocal`
//! and `uniquelocal`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;

const LOOPBACK: &[&str] = &["127.0.0.1/8", "::1/128"];
const LINKLOCAL: &[&str] = &["169.254.0.0/16", "fe80::/10"];
const UNIQUELOCAL: &[&str] = &["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "fc00::/7"];

/// Trust list entry could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid IP address: {0}")]
    InvalidAddress(String),
    #[error("invalid range on address: {0}")]
    InvalidPrefix(String),
}

/// Contiguous block of IPv4 or IPv6 addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    network: IpAddr,
    prefix_len: u8,
}

impl IpRange {
    /// Parse `addr`, `addr/len` or `addr/netmask`
    pub fn parse(entry: &str) -> Result<Self, RangeError> {
        let (addr_str, prefix_str) = match entry.rsplit_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (entry, None),
        };

        let mut addr: IpAddr = addr_str
            .parse()
            .map_err(|_| RangeError::InvalidAddress(entry.to_string()))?;
        let mut mapped = false;
        if let IpAddr::V6(v6) = addr {
            if let Some(v4) = v6.to_ipv4_mapped() {
                addr = IpAddr::V4(v4);
                mapped = true;
            }
        }

        let max = max_prefix(addr);
        let prefix_len = match prefix_str {
            None => max,
            Some(prefix) => parse_prefix(prefix, addr, mapped)
                .ok_or_else(|| RangeError::InvalidPrefix(entry.to_string()))?,
        };
        if prefix_len > max {
            return Err(RangeError::InvalidPrefix(entry.to_string()));
        }

        Ok(Self {
            network: mask(addr, prefix_len),
            prefix_len,
        })
    }

    /// Expand an alias or parse a single entry
    pub fn parse_entry(entry: &str) -> Result<Vec<Self>, RangeError> {
        let aliased = match entry {
            "loopback" => LOOPBACK,
            "linklocal" => LINKLOCAL,
            "uniquelocal" => UNIQUELOCAL,
            _ => return Self::parse(entry).map(|range| vec![range]),
        };
        aliased.iter().map(|e| Self::parse(e)).collect()
    }

    /// Returns true if the address lies within this range
    ///
    /// IPv4-mapped IPv6 addresses are compared against IPv4 ranges and
    /// IPv4 addresses against the mapped form of IPv6 ranges.
    pub fn contains(&self, addr: IpAddr) -> bool {
        let candidate = match (self.network, addr) {
            (IpAddr::V4(_), IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
                Some(v4) => IpAddr::V4(v4),
                None => return false,
            },
            (IpAddr::V6(_), IpAddr::V4(v4)) => IpAddr::V6(v4.to_ipv6_mapped()),
            _ => addr,
        };
        mask(candidate, self.prefix_len) == self.network
    }
}

const fn max_prefix(addr: IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn parse_prefix(prefix: &str, addr: IpAddr, mapped: bool) -> Option<u8> {
    if let Ok(len) = prefix.parse::<u8>() {
        // An IPv4-mapped range written in IPv6 notation
        return if mapped { len.checked_sub(96) } else { Some(len) };
    }

    let netmask: IpAddr = prefix.parse().ok()?;
    match (addr, netmask) {
        (IpAddr::V4(_), IpAddr::V4(m)) => contiguous_len(u128::from(u32::from(m)), 32),
        (IpAddr::V6(_), IpAddr::V6(m)) => contiguous_len(u128::from(m), 128),
        _ => None,
    }
}

/// Prefix length of a netmask, `None` if its bits are not contiguous
fn contiguous_len(bits: u128, width: u32) -> Option<u8> {
    let shifted = bits << (128 - width);
    let ones = shifted.leading_ones();
    let rest = shifted.checked_shl(ones).unwrap_or(0);
    if rest != 0 {
        return None;
    }
    u8::try_from(ones).ok()
}

fn mask(addr: IpAddr, prefix_len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0);
            IpAddr::V4(Ipv4Addr::from(bits & mask))
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix_len)).unwrap_or(0);
            IpAddr::V6(Ipv6Addr::from(bits & mask))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_single_address() {
        let range = IpRange::parse("10.0.0.1").unwrap();
        assert!(range.contains(ip("10.0.0.1")));
        assert!(!range.contains(ip("10.0.0.2")));
    }

    #[test]
    fn test_cidr() {
        let range = IpRange::parse("192.168.1.0/24").unwrap();
        assert!(range.contains(ip("192.168.1.200")));
        assert!(!range.contains(ip("192.168.2.1")));

        let range = IpRange::parse("fe80::/10").unwrap();
        assert!(range.contains(ip("fe80::1")));
        assert!(!range.contains(ip("2001:db8::1")));
    }

    #[test]
    fn test_netmask() {
        let range = IpRange::parse("10.0.0.0/255.0.0.0").unwrap();
        assert!(range.contains(ip("10.20.30.40")));
        assert!(IpRange::parse("10.0.0.0/255.0.255.0").is_err());
    }

    #[test]
    fn test_zero_prefix() {
        let range = IpRange::parse("0.0.0.0/0").unwrap();
        assert!(range.contains(ip("8.8.8.8")));
    }

    #[test]
    fn test_ipv4_mapped() {
        let range = IpRange::parse("127.0.0.1/8").unwrap();
        assert!(range.contains(ip("::ffff:127.0.0.1")));

        let range = IpRange::parse("::ffff:10.0.0.0/104").unwrap();
        assert!(range.contains(ip("10.1.2.3")));
    }

    #[test]
    fn test_aliases() {
        let loopback = IpRange::parse_entry("loopback").unwrap();
        assert!(loopback.iter().any(|r| r.contains(ip("127.0.0.1"))));
        assert!(loopback.iter().any(|r| r.contains(ip("::1"))));

        let unique = IpRange::parse_entry("uniquelocal").unwrap();
        assert!(unique.iter().any(|r| r.contains(ip("172.20.0.1"))));
        assert!(!unique.iter().any(|r| r.contains(ip("8.8.8.8"))));
    }

    #[test]
    fn test_invalid_entries() {
        assert!(matches!(
            IpRange::parse("not-an-ip"),
            Err(RangeError::InvalidAddress(_))
        ));
        assert!(matches!(
            IpRange::parse("10.0.0.0/33"),
            Err(RangeError::InvalidPrefix(_))
        ));
    }
}
