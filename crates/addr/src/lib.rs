//! # Addr - IPv4 Address Utilities
//!
//! Pure helpers for converting between dotted-quad text and the 32-bit
//! host-order keys used by the score store, plus bogon classification.
//!
//! A key is split into a **block id** (upper 24 bits, one /24 network) and a
//! **slot** (lower 8 bits, one host inside that /24):
//!
//! ```text
//!  31                     8 7       0
//! ┌────────────────────────┬─────────┐
//! │        block_id        │  slot   │
//! └────────────────────────┴─────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use addr::{ip_to_u32, u32_to_ip, parse_ipv4};
//!
//! assert_eq!(ip_to_u32("10.0.0.1"), 0x0A00_0001);
//! assert_eq!(u32_to_ip(0x0A00_0001), "10.0.0.1");
//! assert!(parse_ipv4("10.0.0.256").is_err());
//! ```

use std::net::Ipv4Addr;

use thiserror::Error;

/// Errors returned by [`parse_ipv4`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddrError {
    /// Input was empty.
    #[error("empty address")]
    Empty,

    /// A character other than a digit or `.` was found.
    #[error("invalid character {0:?} in address")]
    InvalidChar(char),

    /// An octet had no digits (`1..2.3`, `.1.2.3`, `1.2.3.`).
    #[error("empty octet")]
    EmptyOctet,

    /// An octet was greater than 255.
    #[error("octet out of range")]
    OctetOverflow,

    /// The address did not have exactly four octets.
    #[error("expected 4 octets, found {0}")]
    WrongOctetCount(usize),
}

/// Returns the /24 block id of `addr` (upper 24 bits).
#[inline]
#[must_use]
pub fn block_id(addr: u32) -> u32 {
    addr >> 8
}

/// Returns the host slot of `addr` inside its /24 (lower 8 bits).
#[inline]
#[must_use]
pub fn slot(addr: u32) -> u8 {
    (addr & 0xFF) as u8
}

/// Rebuilds an address from its block id and slot.
#[inline]
#[must_use]
pub fn join(block_id: u32, slot: u8) -> u32 {
    (block_id << 8) | u32::from(slot)
}

/// Parses a dotted-quad IPv4 address into a host-order `u32`.
///
/// Exactly four `.`-separated decimal octets in `0..=255` are accepted.
/// Leading zeros are allowed (`"010.0.0.1"` is `10.0.0.1`); signs,
/// whitespace and any other characters are rejected.
pub fn parse_ipv4(text: &str) -> Result<u32, AddrError> {
    if text.is_empty() {
        return Err(AddrError::Empty);
    }

    let mut result: u32 = 0;
    let mut octet: u32 = 0;
    let mut digits = 0usize;
    let mut octets = 0usize;

    for c in text.chars() {
        match c {
            '0'..='9' => {
                octet = octet * 10 + (c as u32 - '0' as u32);
                digits += 1;
                if octet > 255 {
                    return Err(AddrError::OctetOverflow);
                }
            }
            '.' => {
                if digits == 0 {
                    return Err(AddrError::EmptyOctet);
                }
                octets += 1;
                if octets > 3 {
                    return Err(AddrError::WrongOctetCount(octets + 1));
                }
                result = (result << 8) | octet;
                octet = 0;
                digits = 0;
            }
            other => return Err(AddrError::InvalidChar(other)),
        }
    }

    if digits == 0 {
        return Err(AddrError::EmptyOctet);
    }
    octets += 1;
    if octets != 4 {
        return Err(AddrError::WrongOctetCount(octets));
    }

    Ok((result << 8) | octet)
}

/// Legacy sentinel form of [`parse_ipv4`].
///
/// Returns `0` for any malformed input, which is indistinguishable from the
/// literal address `0.0.0.0`. Use [`parse_ipv4`] when the difference matters.
#[must_use]
pub fn ip_to_u32(text: &str) -> u32 {
    parse_ipv4(text).unwrap_or(0)
}

/// Formats a host-order address as `a.b.c.d`.
#[must_use]
pub fn u32_to_ip(addr: u32) -> String {
    Ipv4Addr::from(addr).to_string()
}

/// Reserved or non-routable networks, as `(network, prefix_len)`.
pub const BOGON_NETWORKS: &[(u32, u8)] = &[
    (0x0000_0000, 8),  // 0.0.0.0/8       "this" network
    (0x0A00_0000, 8),  // 10.0.0.0/8      private
    (0x6440_0000, 10), // 100.64.0.0/10   carrier-grade NAT
    (0x7F00_0000, 8),  // 127.0.0.0/8     loopback
    (0xA9FE_0000, 16), // 169.254.0.0/16  link local
    (0xAC10_0000, 12), // 172.16.0.0/12   private
    (0xC000_0000, 24), // 192.0.0.0/24    IETF protocol assignments
    (0xC000_0200, 24), // 192.0.2.0/24    TEST-NET-1
    (0xC0A8_0000, 16), // 192.168.0.0/16  private
    (0xC612_0000, 15), // 198.18.0.0/15   benchmarking
    (0xC633_6400, 24), // 198.51.100.0/24 TEST-NET-2
    (0xCB00_7100, 24), // 203.0.113.0/24  TEST-NET-3
    (0xE000_0000, 3),  // 224.0.0.0/3     multicast, reserved, broadcast
];

/// Returns `true` if `addr` lies in one of the [`BOGON_NETWORKS`].
#[must_use]
pub fn is_bogon(addr: u32) -> bool {
    BOGON_NETWORKS.iter().any(|&(network, prefix_len)| {
        let mask = u32::MAX << (32 - u32::from(prefix_len));
        addr & mask == network
    })
}

#[cfg(test)]
mod tests;
