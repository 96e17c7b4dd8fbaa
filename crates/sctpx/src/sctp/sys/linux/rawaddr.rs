//! Packed raw sockaddr lists for bindx/connectx and kernel address
//! queries.
//!
//! The kernel expects a contiguous sequence of `sockaddr_in` /
//! `sockaddr_in6` structures with ports in network byte order. Both
//! structs are mirrored here with explicit layouts.

use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::sctp::addr::{AddrFamily, SctpAddr};
use crate::sctp::error::{Error, Result};

/// Mirror of `struct sockaddr_in`.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RawSockaddrIn {
    family: u16,
    /// Network byte order.
    port: [u8; 2],
    addr: [u8; 4],
    zero: [u8; 8],
}

/// Mirror of `struct sockaddr_in6`.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RawSockaddrIn6 {
    family: u16,
    /// Network byte order.
    port: [u8; 2],
    flowinfo: u32,
    addr: [u8; 16],
    scope_id: u32,
}

/// Pack addresses into the contiguous buffer bindx/connectx expect.
pub(crate) fn pack_addrs(family: AddrFamily, addrs: &[SctpAddr]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(addrs.len() * mem::size_of::<RawSockaddrIn6>());
    for addr in addrs {
        pack_into(&mut buf, family, addr)?;
    }
    Ok(buf)
}

/// Pack a single address for use as a `sendmsg` destination.
pub(crate) fn pack_one(family: AddrFamily, addr: &SctpAddr) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(mem::size_of::<RawSockaddrIn6>());
    pack_into(&mut buf, family, addr)?;
    Ok(buf)
}

fn pack_into(buf: &mut Vec<u8>, family: AddrFamily, addr: &SctpAddr) -> Result<()> {
    match family {
        AddrFamily::V4 => {
            let ip = match addr.ip {
                None => Ipv4Addr::UNSPECIFIED,
                Some(IpAddr::V4(ip)) => ip,
                Some(IpAddr::V6(ip)) => ip
                    .to_ipv4_mapped()
                    .ok_or_else(|| Error::addr("non-IPv4 address", addr))?,
            };
            let raw = RawSockaddrIn {
                family: libc::AF_INET as u16,
                port: addr.port.to_be_bytes(),
                addr: ip.octets(),
                zero: [0; 8],
            };
            buf.extend_from_slice(raw.as_bytes());
        }
        AddrFamily::V6 => {
            let ip = match addr.ip {
                None => Ipv6Addr::UNSPECIFIED,
                Some(IpAddr::V6(ip)) => ip,
                Some(IpAddr::V4(ip)) => ip.to_ipv6_mapped(),
            };
            let raw = RawSockaddrIn6 {
                family: libc::AF_INET6 as u16,
                port: addr.port.to_be_bytes(),
                flowinfo: 0,
                addr: ip.octets(),
                scope_id: addr.scope_id,
            };
            buf.extend_from_slice(raw.as_bytes());
        }
    }
    Ok(())
}

/// Parse `count` packed sockaddrs from a kernel getaddrs response.
pub(crate) fn parse_addrs(mut data: &[u8], count: usize) -> Result<Vec<SctpAddr>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        if data.len() < 2 {
            break;
        }
        let family = u16::from_ne_bytes([data[0], data[1]]);
        match i32::from(family) {
            libc::AF_INET => {
                let (raw, rest) = RawSockaddrIn::read_from_prefix(data)
                    .map_err(|_| Error::InvalidMessage("short sockaddr_in in getaddrs response"))?;
                out.push(SctpAddr {
                    ip: Some(IpAddr::V4(Ipv4Addr::from(raw.addr))),
                    port: u16::from_be_bytes(raw.port),
                    scope_id: 0,
                });
                data = rest;
            }
            libc::AF_INET6 => {
                let (raw, rest) = RawSockaddrIn6::read_from_prefix(data).map_err(|_| {
                    Error::InvalidMessage("short sockaddr_in6 in getaddrs response")
                })?;
                out.push(SctpAddr {
                    ip: Some(IpAddr::V6(Ipv6Addr::from(raw.addr))),
                    port: u16::from_be_bytes(raw.port),
                    scope_id: raw.scope_id,
                });
                data = rest;
            }
            _ => {
                return Err(Error::InvalidMessage(
                    "unsupported sockaddr family in getaddrs response",
                ));
            }
        }
    }
    Ok(out)
}

/// Convert a kernel-filled sockaddr (e.g. `recvmsg` msg_name) to an
/// endpoint address. Unknown or unspecified families yield `None`.
pub(crate) fn parse_one(data: &[u8]) -> Option<SctpAddr> {
    if data.len() < 2 {
        return None;
    }
    let family = u16::from_ne_bytes([data[0], data[1]]);
    match i32::from(family) {
        libc::AF_INET => {
            let (raw, _) = RawSockaddrIn::read_from_prefix(data).ok()?;
            Some(SctpAddr {
                ip: Some(IpAddr::V4(Ipv4Addr::from(raw.addr))),
                port: u16::from_be_bytes(raw.port),
                scope_id: 0,
            })
        }
        libc::AF_INET6 => {
            let (raw, _) = RawSockaddrIn6::read_from_prefix(data).ok()?;
            Some(SctpAddr {
                ip: Some(IpAddr::V6(Ipv6Addr::from(raw.addr))),
                port: u16::from_be_bytes(raw.port),
                scope_id: raw.scope_id,
            })
        }
        _ => None,
    }
}
