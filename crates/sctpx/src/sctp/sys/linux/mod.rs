//! Kernel SCTP socket operations for Linux.
//!
//! One-to-many SEQPACKET sockets over the kernel's SCTP stack. Message
//! I/O goes through nonblocking `sendmsg`/`recvmsg` driven by tokio
//! readiness; configuration and association setup are `setsockopt` /
//! `getsockopt` calls at level IPPROTO_SCTP.

mod cmsg;
mod rawaddr;

use std::io;
use std::mem;
use std::os::unix::io::AsRawFd;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::sctp::addr::{AddrFamily, SctpAddr};
use crate::sctp::error::{Error, Result};
use crate::sctp::types::{Event, EventMask, InitOptions, RecvMsg, SendInfo};

// Socket options at level IPPROTO_SCTP.
const SCTP_INITMSG: libc::c_int = 2;
const SCTP_NODELAY: libc::c_int = 3;
const SCTP_RECVRCVINFO: libc::c_int = 32;
const SCTP_SOCKOPT_BINDX_ADD: libc::c_int = 100;
const SCTP_SOCKOPT_CONNECTX_OLD: libc::c_int = 107;
const SCTP_GET_PEER_ADDRS: libc::c_int = 108;
const SCTP_GET_LOCAL_ADDRS: libc::c_int = 109;
const SCTP_SOCKOPT_CONNECTX: libc::c_int = 110;
const SCTP_EVENT: libc::c_int = 127;

const LISTEN_BACKLOG: libc::c_int = 128;

/// Mirror of `struct sctp_initmsg`.
#[repr(C)]
#[derive(Debug, Clone, Copy, IntoBytes, Immutable, KnownLayout)]
struct RawInitMsg {
    num_ostreams: u16,
    max_instreams: u16,
    max_attempts: u16,
    max_init_timeout: u16,
}

/// Mirror of `struct sctp_event`.
#[repr(C)]
#[derive(Debug, Clone, Copy, IntoBytes, Immutable, KnownLayout)]
struct RawEvent {
    assoc_id: i32,
    kind: u16,
    on: u8,
    reserved: u8,
}

/// Mirror of `struct sctp_getaddrs`, the getsockopt header for the
/// GET_*_ADDRS queries.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RawGetAddrs {
    assoc_id: i32,
    addr_num: u32,
}

/// A nonblocking one-to-many kernel SCTP socket.
#[derive(Debug)]
pub(crate) struct SysSocket {
    fd: AsyncFd<Socket>,
    family: AddrFamily,
    connected: bool,
}

impl SysSocket {
    /// Create a SEQPACKET SCTP socket, bind it when a local address is
    /// given, and (for listeners) start accepting new associations.
    pub(crate) fn open(
        family: AddrFamily,
        laddr: Option<&SctpAddr>,
        listen: bool,
    ) -> Result<Self> {
        let domain = match family {
            AddrFamily::V4 => Domain::IPV4,
            AddrFamily::V6 => Domain::IPV6,
        };
        let socket = Socket::new(
            domain,
            Type::SEQPACKET,
            Some(Protocol::from(libc::IPPROTO_SCTP)),
        )
        .map_err(|source| Error::Syscall {
            op: "socket",
            source,
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|source| Error::Syscall {
                op: "socket",
                source,
            })?;

        if listen || laddr.is_some() {
            let bind_to = match laddr {
                Some(addr) => addr.to_socket_addr(family)?,
                None => SctpAddr::default().to_socket_addr(family)?,
            };
            socket
                .bind(&SockAddr::from(bind_to))
                .map_err(|source| Error::Syscall { op: "bind", source })?;
        }
        if listen {
            socket
                .listen(LISTEN_BACKLOG)
                .map_err(|source| Error::Syscall {
                    op: "listen",
                    source,
                })?;
        }

        let fd = AsyncFd::new(socket)?;
        Ok(Self {
            fd,
            family,
            connected: false,
        })
    }

    fn raw_fd(&self) -> libc::c_int {
        self.fd.get_ref().as_raw_fd()
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn local_addr(&self) -> Result<SctpAddr> {
        let sa = self
            .fd
            .get_ref()
            .local_addr()
            .map_err(|source| Error::Syscall {
                op: "getsockname",
                source,
            })?;
        Ok(sa.as_socket().map(SctpAddr::from).unwrap_or_default())
    }

    pub(crate) fn peer_addr(&self) -> Result<SctpAddr> {
        let sa = self
            .fd
            .get_ref()
            .peer_addr()
            .map_err(|source| Error::Syscall {
                op: "getpeername",
                source,
            })?;
        Ok(sa.as_socket().map(SctpAddr::from).unwrap_or_default())
    }

    // ========================================================================
    // Message I/O
    // ========================================================================

    /// Receive one message with its flags, source address and metadata.
    pub(crate) async fn recv_msg(&self, buf: &mut [u8]) -> Result<RecvMsg> {
        let mut oob = vec![0u8; cmsg::recv_buffer_size()];
        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;
            match guard.try_io(|inner| recv_msg_raw(inner.get_ref(), &mut *buf, &mut oob)) {
                Ok(result) => {
                    let (len, flags, from, oob_len) =
                        result.map_err(|source| Error::Syscall {
                            op: "recvmsg",
                            source,
                        })?;
                    let info = cmsg::parse_recv_info(&oob[..oob_len])?;
                    return Ok(RecvMsg {
                        len,
                        flags,
                        from,
                        info,
                    });
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Send one message, optionally addressed and carrying send metadata.
    pub(crate) async fn send_msg(
        &self,
        buf: &[u8],
        to: Option<&SctpAddr>,
        info: Option<&SendInfo>,
    ) -> Result<usize> {
        let oob = cmsg::marshal_send_info(info);
        let dest = match to {
            Some(addr) => Some(rawaddr::pack_one(self.family, addr)?),
            None => None,
        };
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;
            match guard.try_io(|inner| send_msg_raw(inner.get_ref(), buf, dest.as_deref(), &oob))
            {
                Ok(result) => {
                    return result.map_err(|source| Error::Syscall {
                        op: "sendmsg",
                        source,
                    });
                }
                Err(_would_block) => continue,
            }
        }
    }

    // ========================================================================
    // Socket options
    // ========================================================================

    fn set_sctp_opt(&self, opt: libc::c_int, value: &[u8]) -> Result<()> {
        let rc = unsafe {
            libc::setsockopt(
                self.raw_fd(),
                libc::IPPROTO_SCTP,
                opt,
                value.as_ptr().cast(),
                value.len() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(Error::syscall("setsockopt"));
        }
        Ok(())
    }

    pub(crate) fn set_nodelay(&self, on: bool) -> Result<()> {
        let value: libc::c_int = i32::from(on);
        self.set_sctp_opt(SCTP_NODELAY, &value.to_ne_bytes())
    }

    /// Apply SCTP_INITMSG, then enable RCVINFO delivery so subsequent
    /// reads carry per-message metadata.
    pub(crate) fn set_init_options(&self, opts: &InitOptions) -> Result<()> {
        let raw = RawInitMsg {
            num_ostreams: opts.num_ostreams,
            max_instreams: opts.max_instreams,
            max_attempts: opts.max_attempts,
            max_init_timeout: opts.max_init_timeout,
        };
        self.set_sctp_opt(SCTP_INITMSG, raw.as_bytes())?;
        self.set_sctp_opt(SCTP_RECVRCVINFO, &1i32.to_ne_bytes())
    }

    /// One setsockopt per event kind. A failure aborts the sequence;
    /// kinds already applied stay applied.
    pub(crate) fn subscribe_events(&self, mask: &EventMask) -> Result<()> {
        for event in Event::ALL {
            let raw = RawEvent {
                assoc_id: 0,
                kind: event.kind_id(),
                on: u8::from(mask.enabled(event)),
                reserved: 0,
            };
            self.set_sctp_opt(SCTP_EVENT, raw.as_bytes())?;
        }
        Ok(())
    }

    // ========================================================================
    // Multi-address association setup
    // ========================================================================

    /// Add extra local addresses to the socket (bindx). No-op for an
    /// empty list.
    pub(crate) fn bind_addrs(&self, addrs: &[SctpAddr]) -> Result<()> {
        if addrs.is_empty() {
            return Ok(());
        }
        let packed = rawaddr::pack_addrs(self.family, addrs)?;
        self.set_sctp_opt(SCTP_SOCKOPT_BINDX_ADD, &packed)
    }

    /// Initiate an association across all peer addresses (connectx) and
    /// return the association id.
    pub(crate) fn connect_addrs(&self, addrs: &[SctpAddr]) -> Result<i32> {
        if addrs.is_empty() {
            return Err(Error::MissingAddress);
        }
        let packed = rawaddr::pack_addrs(self.family, addrs)?;
        match self.connectx(SCTP_SOCKOPT_CONNECTX, &packed) {
            Ok(id) => Ok(id),
            // Older kernels only accept the legacy opcode.
            Err(err) if err.errno() == Some(libc::ENOPROTOOPT) => {
                self.connectx(SCTP_SOCKOPT_CONNECTX_OLD, &packed)
            }
            Err(err) => Err(err),
        }
    }

    fn connectx(&self, opt: libc::c_int, packed: &[u8]) -> Result<i32> {
        let rc = unsafe {
            libc::setsockopt(
                self.raw_fd(),
                libc::IPPROTO_SCTP,
                opt,
                packed.as_ptr().cast(),
                packed.len() as libc::socklen_t,
            )
        };
        if rc >= 0 {
            return Ok(rc);
        }
        let source = io::Error::last_os_error();
        match source.raw_os_error() {
            // Setup is in flight; the kernel assigns the id once the
            // association completes.
            Some(libc::EINPROGRESS) | Some(libc::EALREADY) => Ok(0),
            _ => Err(Error::Syscall {
                op: "setsockopt",
                source,
            }),
        }
    }

    // ========================================================================
    // Kernel address queries
    // ========================================================================

    pub(crate) fn local_addrs(&self, assoc_id: i32) -> Result<Vec<SctpAddr>> {
        self.get_addrs(SCTP_GET_LOCAL_ADDRS, assoc_id)
    }

    pub(crate) fn peer_addrs(&self, assoc_id: i32) -> Result<Vec<SctpAddr>> {
        self.get_addrs(SCTP_GET_PEER_ADDRS, assoc_id)
    }

    fn get_addrs(&self, opt: libc::c_int, assoc_id: i32) -> Result<Vec<SctpAddr>> {
        // Room for the header plus dozens of sockaddr entries.
        let mut buf = vec![0u8; 64 * 1024];
        let hdr_size = mem::size_of::<RawGetAddrs>();
        let hdr = RawGetAddrs {
            assoc_id,
            addr_num: 0,
        };
        buf[..hdr_size].copy_from_slice(hdr.as_bytes());

        let mut opt_len = buf.len() as libc::socklen_t;
        let rc = unsafe {
            libc::getsockopt(
                self.raw_fd(),
                libc::IPPROTO_SCTP,
                opt,
                buf.as_mut_ptr().cast(),
                &mut opt_len,
            )
        };
        if rc < 0 {
            return Err(Error::syscall("getsockopt"));
        }
        let opt_len = (opt_len as usize).min(buf.len());
        if opt_len < hdr_size {
            return Err(Error::InvalidMessage("short getaddrs response"));
        }
        let (hdr, _) = RawGetAddrs::read_from_prefix(&buf[..opt_len])
            .map_err(|_| Error::InvalidMessage("short getaddrs response"))?;
        rawaddr::parse_addrs(&buf[hdr_size..opt_len], hdr.addr_num as usize)
    }
}

fn recv_msg_raw(
    socket: &Socket,
    buf: &mut [u8],
    oob: &mut [u8],
) -> io::Result<(usize, i32, Option<SctpAddr>, usize)> {
    let mut name: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut iov = libc::iovec {
        iov_base: buf.as_mut_ptr().cast(),
        iov_len: buf.len(),
    };
    let mut msg: libc::msghdr = unsafe { mem::zeroed() };
    msg.msg_name = &mut name as *mut libc::sockaddr_storage as *mut libc::c_void;
    msg.msg_namelen = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;
    msg.msg_control = oob.as_mut_ptr().cast();
    msg.msg_controllen = oob.len() as _;

    let n = unsafe { libc::recvmsg(socket.as_raw_fd(), &mut msg, 0) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }

    let name_len =
        (msg.msg_namelen as usize).min(mem::size_of::<libc::sockaddr_storage>());
    let from = if name_len == 0 {
        None
    } else {
        let name_bytes = unsafe {
            std::slice::from_raw_parts(
                &name as *const libc::sockaddr_storage as *const u8,
                name_len,
            )
        };
        rawaddr::parse_one(name_bytes)
    };
    let oob_len = (msg.msg_controllen as usize).min(oob.len());
    Ok((n as usize, msg.msg_flags, from, oob_len))
}

fn send_msg_raw(
    socket: &Socket,
    buf: &[u8],
    dest: Option<&[u8]>,
    oob: &[u8],
) -> io::Result<usize> {
    let mut iov = libc::iovec {
        iov_base: buf.as_ptr() as *mut libc::c_void,
        iov_len: buf.len(),
    };
    let mut msg: libc::msghdr = unsafe { mem::zeroed() };
    if let Some(dest) = dest {
        msg.msg_name = dest.as_ptr() as *mut libc::c_void;
        msg.msg_namelen = dest.len() as libc::socklen_t;
    }
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;
    if !oob.is_empty() {
        msg.msg_control = oob.as_ptr() as *mut libc::c_void;
        msg.msg_controllen = oob.len() as _;
    }

    let n = unsafe { libc::sendmsg(socket.as_raw_fd(), &msg, 0) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}
