//! SCTP endpoint addressing: single and multi-homed address types,
//! resolution, and multi-address validation.
//!
//! A multi-homed association is described by an ordered list of endpoint
//! addresses sharing one family and one port. Order is meaningful: the
//! first entry is the primary used for the initial bind/connect, the rest
//! are added through bindx/connectx.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use super::error::{Error, Result};

/// SCTP network tokens accepted by every public entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Network {
    /// "sctp": either address family, uniform across a multi-address.
    Any,
    /// "sctp4": IPv4 only.
    V4,
    /// "sctp6": IPv6 only (IPv4-mapped addresses excluded).
    V6,
}

impl Network {
    pub(crate) fn parse(network: &str) -> Result<Self> {
        match network {
            "sctp" => Ok(Network::Any),
            "sctp4" => Ok(Network::V4),
            "sctp6" => Ok(Network::V6),
            _ => Err(Error::UnknownNetwork(network.to_string())),
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Network::Any => "sctp",
            Network::V4 => "sctp4",
            Network::V6 => "sctp6",
        }
    }
}

/// Address family of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrFamily {
    V4,
    V6,
}

/// The address of an SCTP endpoint.
///
/// `ip` of `None` is the family-agnostic wildcard. `scope_id` is the
/// numeric IPv6 scope identifier and is zero for IPv4 addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SctpAddr {
    pub ip: Option<IpAddr>,
    pub port: u16,
    pub scope_id: u32,
}

impl SctpAddr {
    /// Create an endpoint address from an IP and port.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            ip: Some(ip),
            port,
            scope_id: 0,
        }
    }

    /// Address family, inferred the way the kernel interprets the address:
    /// absent, IPv4, and IPv4-mapped IPv6 addresses are IPv4.
    pub fn family(&self) -> AddrFamily {
        match self.ip {
            None | Some(IpAddr::V4(_)) => AddrFamily::V4,
            Some(IpAddr::V6(ip)) => {
                if ip.to_ipv4_mapped().is_some() {
                    AddrFamily::V4
                } else {
                    AddrFamily::V6
                }
            }
        }
    }

    /// Convert to a socket address of the given family for bind/sendmsg.
    ///
    /// Absent IPs become the family's unspecified address; IPv4 addresses
    /// are mapped when an IPv6 socket address is requested.
    pub(crate) fn to_socket_addr(&self, family: AddrFamily) -> Result<SocketAddr> {
        match family {
            AddrFamily::V4 => {
                let ip = match self.ip {
                    None => Ipv4Addr::UNSPECIFIED,
                    Some(IpAddr::V4(ip)) => ip,
                    Some(IpAddr::V6(ip)) => ip
                        .to_ipv4_mapped()
                        .ok_or_else(|| Error::addr("non-IPv4 address", self))?,
                };
                Ok(SocketAddr::V4(SocketAddrV4::new(ip, self.port)))
            }
            AddrFamily::V6 => {
                let ip = match self.ip {
                    None => Ipv6Addr::UNSPECIFIED,
                    Some(IpAddr::V6(ip)) => ip,
                    Some(IpAddr::V4(ip)) => ip.to_ipv6_mapped(),
                };
                Ok(SocketAddr::V6(SocketAddrV6::new(
                    ip,
                    self.port,
                    0,
                    self.scope_id,
                )))
            }
        }
    }
}

impl From<SocketAddr> for SctpAddr {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => Self {
                ip: Some(IpAddr::V4(*v4.ip())),
                port: v4.port(),
                scope_id: 0,
            },
            SocketAddr::V6(v6) => Self {
                ip: Some(IpAddr::V6(*v6.ip())),
                port: v6.port(),
                scope_id: v6.scope_id(),
            },
        }
    }
}

impl fmt::Display for SctpAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            None => write!(f, ":{}", self.port),
            Some(IpAddr::V4(ip)) => write!(f, "{}:{}", ip, self.port),
            Some(IpAddr::V6(ip)) if self.scope_id != 0 => {
                write!(f, "[{}%{}]:{}", ip, self.scope_id, self.port)
            }
            Some(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
        }
    }
}

/// An ordered set of SCTP endpoint addresses for one multi-homed endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SctpMultiAddr {
    pub addrs: Vec<SctpAddr>,
}

impl SctpMultiAddr {
    /// Create a multi-address from an ordered list of endpoints.
    pub fn new(addrs: Vec<SctpAddr>) -> Self {
        Self { addrs }
    }

    /// The primary address, used for the initial bind/connect.
    pub fn first(&self) -> Option<&SctpAddr> {
        self.addrs.first()
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

impl fmt::Display for SctpMultiAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.addrs.is_empty() {
            return write!(f, "<empty>");
        }
        for (i, addr) in self.addrs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{addr}")?;
        }
        Ok(())
    }
}

/// Resolve `host:port` to an SCTP endpoint address.
///
/// Resolution is delegated to the runtime's host lookup; the first result
/// whose family satisfies `network` wins.
pub async fn resolve_addr(network: &str, address: &str) -> Result<SctpAddr> {
    let net = Network::parse(network)?;
    let mut rejected = None;
    for candidate in tokio::net::lookup_host(address).await? {
        let addr = SctpAddr::from(candidate);
        if family_matches(net, &addr) {
            return Ok(addr);
        }
        rejected = Some(addr);
    }
    match rejected {
        Some(addr) => Err(Error::addr(family_mismatch_reason(net), &addr)),
        None => Err(Error::MissingAddress),
    }
}

/// Resolve a list of `host:port` strings to a validated multi-address.
///
/// Every entry must share the family mandated by `network` and carry the
/// same non-ambiguous port (zero ports are not accepted here; they are
/// only meaningful for local bind-time lists).
pub async fn resolve_multi_addr<S: AsRef<str>>(
    network: &str,
    addresses: &[S],
) -> Result<SctpMultiAddr> {
    let net = Network::parse(network)?;
    if addresses.is_empty() {
        return Err(Error::MissingAddress);
    }
    let mut addrs = Vec::with_capacity(addresses.len());
    for address in addresses {
        addrs.push(resolve_addr(network, address.as_ref()).await?);
    }
    validate_multi(net, &addrs, false)?;
    Ok(SctpMultiAddr { addrs })
}

fn family_matches(net: Network, addr: &SctpAddr) -> bool {
    match net {
        Network::Any => true,
        Network::V4 => addr.family() == AddrFamily::V4,
        Network::V6 => addr.family() == AddrFamily::V6,
    }
}

fn family_mismatch_reason(net: Network) -> &'static str {
    match net {
        Network::V4 => "non-IPv4 address",
        Network::V6 => "non-IPv6 address",
        Network::Any => "unusable address",
    }
}

/// Validate a multi-address list: non-empty, single family consistent with
/// `network`, uniform port. The first entry fixes family and port.
///
/// With `allow_zero_port` (local bind-time lists), zero ports are tolerated
/// as long as at least one entry carries a concrete port; the first
/// concrete port becomes the effective port for the set.
pub(crate) fn validate_multi(
    network: Network,
    addrs: &[SctpAddr],
    allow_zero_port: bool,
) -> Result<()> {
    if addrs.is_empty() {
        return Err(Error::MissingAddress);
    }
    let mut family = None;
    let mut port = 0u16;
    for (i, addr) in addrs.iter().enumerate() {
        validate_family(network, addr)?;
        let af = addr.family();
        match family {
            None => family = Some(af),
            Some(fixed) if fixed != af => {
                return Err(Error::addr("mixed address family in multi-address", addr));
            }
            Some(_) => {}
        }
        if i == 0 {
            port = addr.port;
        } else if addr.port == port {
            // uniform
        } else if allow_zero_port && (addr.port == 0 || port == 0) {
            if port == 0 {
                port = addr.port;
            }
        } else {
            return Err(Error::addr("mismatched port in multi-address", addr));
        }
    }
    Ok(())
}

fn validate_family(network: Network, addr: &SctpAddr) -> Result<()> {
    match network {
        Network::V4 => {
            if addr.ip.is_some() && addr.family() != AddrFamily::V4 {
                return Err(Error::addr("non-IPv4 address", addr));
            }
        }
        Network::V6 => {
            if addr.ip.is_some() && addr.family() != AddrFamily::V6 {
                return Err(Error::addr("non-IPv6 address", addr));
            }
        }
        Network::Any => {}
    }
    Ok(())
}
