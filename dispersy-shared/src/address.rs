//! IPv4 socket addresses and the address-validity rule used across the overlay.

use std::fmt;
use std::net::Ipv4Addr;

/// An IPv4 host/port pair as exchanged on the wire.
///
/// Kept distinct from `std::net::SocketAddrV4` because the overlay treats
/// `(0.0.0.0, 0)` as a first-class "unknown address" sentinel rather than an
/// error, and needs that sentinel to round-trip through serialization.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SockAddrV4 {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl SockAddrV4 {
    pub const UNKNOWN: SockAddrV4 = SockAddrV4 {
        host: Ipv4Addr::UNSPECIFIED,
        port: 0,
    };

    pub fn new(host: Ipv4Addr, port: u16) -> Self {
        SockAddrV4 { host, port }
    }

    pub fn is_unknown(&self) -> bool {
        self.host.is_unspecified() && self.port == 0
    }
}

impl fmt::Display for SockAddrV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The exact validity rule from the overlay's wire contract: non-empty,
/// not `0.0.0.0`, port nonzero, and the last octet neither `0` nor `255`
/// (both are reserved broadcast/network forms that a real peer can never bind).
pub fn is_valid_address(addr: &SockAddrV4) -> bool {
    if addr.port == 0 {
        return false;
    }
    if addr.host.is_unspecified() {
        return false;
    }
    let last = addr.host.octets()[3];
    if last == 0 || last == 0xff {
        return false;
    }
    true
}
