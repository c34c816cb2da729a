//! Static IP range → region resolution.

use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::config::RegionRangeConfig;

/// Invalid CIDR notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid CIDR range {0:?}")]
pub struct CidrError(pub String);

/// An IPv4 or IPv6 network in CIDR form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    network: IpAddr,
    prefix: u8,
}

impl IpRange {
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => u32::from(ip) & mask_v4(self.prefix) == u32::from(net),
            (IpAddr::V6(net), IpAddr::V6(ip)) => u128::from(ip) & mask_v6(self.prefix) == u128::from(net),
            _ => false,
        }
    }
}

fn mask_v4(prefix: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0)
}

fn mask_v6(prefix: u8) -> u128 {
    u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0)
}

impl FromStr for IpRange {
    type Err = CidrError;

    /// Accepts `addr/prefix` or a bare address (a single-host range).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CidrError(s.to_string());
        let (addr, prefix) = match s.trim().split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s.trim(), None),
        };
        let addr: IpAddr = addr.parse().map_err(|_| err())?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix {
            Some(p) => p.parse::<u8>().map_err(|_| err())?,
            None => max,
        };
        if prefix > max {
            return Err(err());
        }

        let network = match addr {
            IpAddr::V4(a) => IpAddr::V4((u32::from(a) & mask_v4(prefix)).into()),
            IpAddr::V6(a) => IpAddr::V6((u128::from(a) & mask_v6(prefix)).into()),
        };
        Ok(Self { network, prefix })
    }
}

/// Longest-prefix lookup table of ranges to region codes.
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    entries: Vec<(IpRange, String)>,
}

impl RegionTable {
    pub fn from_config(ranges: &[RegionRangeConfig]) -> Result<Self, CidrError> {
        let entries = ranges
            .iter()
            .map(|r| Ok((r.cidr.parse::<IpRange>()?, r.region.trim().to_ascii_uppercase())))
            .collect::<Result<Vec<_>, CidrError>>()?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, ip: IpAddr) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(range, _)| range.contains(ip))
            .max_by_key(|(range, _)| range.prefix())
            .map(|(_, region)| region.as_str())
    }
}
