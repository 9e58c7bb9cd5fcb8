//! IPv4 CIDR arithmetic for subnet derivation
//!
//! Subnet blocks and instance addresses are derived through [`Ipv4Cidr`]
//! instead of string formatting, so containment and disjointness can be
//! checked directly.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// An IPv4 address block: a network address plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    network: u32,
    prefix: u8,
}

/// Error parsing a CIDR block from its `a.b.c.d/len` form.
#[derive(Debug, Error)]
#[error("invalid CIDR block: {0}")]
pub struct ParseCidrError(String);

impl Ipv4Cidr {
    /// Create a block from a base address and prefix length.
    ///
    /// Host bits of `addr` are masked off. Panics if `prefix > 32`; the
    /// prefixes in this crate are compile-time constants.
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Self {
        assert!(prefix <= 32, "prefix length {prefix} out of range");
        Self {
            network: u32::from(addr) & mask_bits(prefix),
            prefix,
        }
    }

    /// The network address of this block.
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    /// The prefix length of this block.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in this block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.prefix)
    }

    /// Address `n` within this block (network address plus `n`).
    pub fn host(&self, n: u32) -> Ipv4Addr {
        debug_assert!(u64::from(n) < self.size(), "host offset {n} out of block");
        Ipv4Addr::from(self.network + n)
    }

    /// Whether `addr` falls inside this block.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & mask_bits(self.prefix) == self.network
    }

    /// Whether `other` is entirely inside this block.
    pub fn contains_block(&self, other: &Ipv4Cidr) -> bool {
        other.prefix >= self.prefix && self.contains(other.network())
    }

    /// Whether this block and `other` share any address.
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other.network()) || other.contains(self.network())
    }
}

fn mask_bits(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = ParseCidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| ParseCidrError(s.to_string()))?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| ParseCidrError(s.to_string()))?;
        let prefix: u8 = prefix.parse().map_err(|_| ParseCidrError(s.to_string()))?;
        if prefix > 32 {
            return Err(ParseCidrError(s.to_string()));
        }
        Ok(Self::new(addr, prefix))
    }
}
