//! Address range matching.
//!
//! # Responsibilities
//! - Test whether an address falls inside a CIDR prefix (IPv4 and IPv6)
//! - Fall back to literal / textual-prefix comparison for entries without `/`
//!
//! # Design Decisions
//! - CIDR entries are parsed once into [`IpNet`]; host bits in the subnet
//!   are ignored and an address of the other family never matches
//! - Malformed entries never match and never error
//! - Literal entries match by exact-or-starts-with, so `"66.249."` covers any
//!   address sharing that text prefix. This is looser than CIDR and is kept
//!   for compatibility with existing filter files.

use std::net::IpAddr;

use ipnet::IpNet;

/// A parsed address-range specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// `subnet/prefix_len` with a prefix length valid for the subnet's family.
    Cidr(IpNet),
    /// Exact address or leading text of an address.
    Literal(String),
    /// Unparseable or empty entry. Never matches.
    Invalid,
}

impl RangeSpec {
    /// Parse a range specifier. Never fails; bad input becomes `Invalid`.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() {
            return RangeSpec::Invalid;
        }

        if !spec.contains('/') {
            return RangeSpec::Literal(spec.to_string());
        }

        match spec.parse::<IpNet>() {
            Ok(net) => RangeSpec::Cidr(net),
            Err(_) => RangeSpec::Invalid,
        }
    }

    /// Check a caller address against this range.
    ///
    /// `parsed` is `address` already run through `IpAddr::from_str`, so a
    /// scan over many ranges parses the caller address once.
    pub fn contains(&self, address: &str, parsed: Option<IpAddr>) -> bool {
        match self {
            RangeSpec::Cidr(net) => parsed.is_some_and(|ip| net.contains(&ip)),
            RangeSpec::Literal(literal) => address == literal || address.starts_with(literal.as_str()),
            RangeSpec::Invalid => false,
        }
    }
}

/// Returns true if `address` is covered by `range_spec`.
pub fn matches(address: &str, range_spec: &str) -> bool {
    let address = address.trim();
    RangeSpec::parse(range_spec).contains(address, address.parse().ok())
}
