//! Message-oriented SCTP connections and the dial/listen entry points.

use super::addr::{validate_multi, AddrFamily, Network, SctpAddr, SctpMultiAddr};
use super::error::{Error, Result};
use super::sys::SysSocket;
use super::types::{EventMask, InitOptions, RecvMsg, SendInfo};

/// A message-oriented SCTP connection over a one-to-many socket.
///
/// Created by [`dial`]/[`listen`] and their multi-address variants. The
/// connection owns its socket and address vectors; dropping it closes the
/// socket. Multi-address vectors are written only at dial/listen time and
/// are read-only afterwards; accessors return copies.
#[derive(Debug)]
pub struct SctpConn {
    sock: SysSocket,
    net: Network,
    multi_local: Option<Vec<SctpAddr>>,
    multi_peer: Option<Vec<SctpAddr>>,
    default_peer: Option<SctpAddr>,
    assoc_id: Option<i32>,
}

impl SctpConn {
    /// Receive one SCTP message into `buf`.
    ///
    /// Exactly one message is delivered per call; the kernel's per-stream
    /// ordering is preserved. Check [`RecvMsg::is_notification`]: a
    /// notification frame carries a stack event, not user data, and should
    /// be skipped and read again.
    pub async fn recv_msg(&self, buf: &mut [u8]) -> Result<RecvMsg> {
        self.sock
            .recv_msg(buf)
            .await
            .map_err(|e| self.op_err("read", e))
    }

    /// Send one SCTP message, optionally addressed and carrying
    /// per-message metadata.
    ///
    /// On an unconnected socket with no explicit destination, the
    /// connection's default peer is used; lacking one is an error. An
    /// explicit destination on a connected socket is an error.
    pub async fn send_msg(
        &self,
        buf: &[u8],
        to: Option<&SctpAddr>,
        info: Option<&SendInfo>,
    ) -> Result<usize> {
        if self.sock.is_connected() && to.is_some() {
            return Err(self.op_err("write", Error::WriteToConnected));
        }
        let dest = match to {
            Some(addr) => Some(addr),
            None if self.sock.is_connected() => None,
            None => match &self.default_peer {
                Some(addr) => Some(addr),
                None => return Err(self.op_err("write", Error::MissingAddress)),
            },
        };
        self.sock
            .send_msg(buf, dest, info)
            .await
            .map_err(|e| self.op_err("write", e))
    }

    /// Toggle SCTP_NODELAY.
    pub fn set_nodelay(&self, on: bool) -> Result<()> {
        self.sock.set_nodelay(on).map_err(|e| self.op_err("set", e))
    }

    /// Configure SCTP_INITMSG and enable per-message receive metadata.
    pub fn set_init_options(&self, opts: &InitOptions) -> Result<()> {
        self.sock
            .set_init_options(opts)
            .map_err(|e| self.op_err("set", e))
    }

    /// Apply an event subscription mask, one setsockopt per event kind.
    ///
    /// A failure aborts the sequence without unwinding kinds already
    /// applied; callers are expected to close the connection on error.
    pub fn subscribe_events(&self, mask: &EventMask) -> Result<()> {
        self.sock
            .subscribe_events(mask)
            .map_err(|e| self.op_err("set", e))
    }

    /// Local addresses of this endpoint, in bind order.
    ///
    /// Multi-homed connections return the vector recorded at setup time;
    /// otherwise a single entry from `getsockname`.
    pub fn local_addrs(&self) -> Result<Vec<SctpAddr>> {
        if let Some(addrs) = &self.multi_local {
            return Ok(addrs.clone());
        }
        Ok(vec![self.local_addr()?])
    }

    /// Peer addresses of the association, in the order supplied to dial.
    pub fn peer_addrs(&self) -> Result<Vec<SctpAddr>> {
        if let Some(addrs) = &self.multi_peer {
            return Ok(addrs.clone());
        }
        let peer = self
            .sock
            .peer_addr()
            .map_err(|e| self.op_err("get", e))?;
        Ok(vec![peer])
    }

    /// Ask the kernel for the association's local addresses
    /// (SCTP_GET_LOCAL_ADDRS), bypassing the stored vector.
    pub fn query_local_addrs(&self) -> Result<Vec<SctpAddr>> {
        self.sock
            .local_addrs(self.assoc_id.unwrap_or(0))
            .map_err(|e| self.op_err("get", e))
    }

    /// Ask the kernel for the association's peer addresses
    /// (SCTP_GET_PEER_ADDRS), bypassing the stored vector.
    pub fn query_peer_addrs(&self) -> Result<Vec<SctpAddr>> {
        self.sock
            .peer_addrs(self.assoc_id.unwrap_or(0))
            .map_err(|e| self.op_err("get", e))
    }

    /// The bound local endpoint (`getsockname`).
    pub fn local_addr(&self) -> Result<SctpAddr> {
        self.sock.local_addr().map_err(|e| self.op_err("get", e))
    }

    /// The default destination for sends without an explicit address.
    pub fn remote_addr(&self) -> Option<&SctpAddr> {
        self.default_peer.as_ref()
    }

    /// The association id assigned at connectx time, if any.
    pub fn assoc_id(&self) -> Option<i32> {
        self.assoc_id
    }

    fn op_err(&self, op: &'static str, cause: Error) -> Error {
        if matches!(cause, Error::Op(_)) {
            return cause;
        }
        Error::op(
            op,
            self.net.name(),
            self.sock.local_addr().ok(),
            self.default_peer.as_ref().map(|a| a.to_string()),
            cause,
        )
    }
}

/// Establish an SCTP connection to `raddr`, optionally bound to `laddr`.
///
/// Uses a one-to-many style socket: no `connect(2)` is issued, and
/// `raddr` is retained as the default destination for subsequent sends.
pub fn dial(network: &str, laddr: Option<&SctpAddr>, raddr: &SctpAddr) -> Result<SctpConn> {
    let wrap = |cause| {
        Error::op(
            "dial",
            network,
            laddr.cloned(),
            Some(raddr.to_string()),
            cause,
        )
    };
    let net = Network::parse(network).map_err(&wrap)?;
    let family = socket_family(net, laddr, Some(raddr));
    let sock = SysSocket::open(family, laddr, false).map_err(&wrap)?;
    let multi_local = sock.local_addr().ok().map(|a| vec![a]);
    Ok(SctpConn {
        sock,
        net,
        multi_local,
        multi_peer: Some(vec![raddr.clone()]),
        default_peer: Some(raddr.clone()),
        assoc_id: None,
    })
}

/// Establish a multi-homed SCTP association.
///
/// The primary (first) addresses drive the initial socket setup; extra
/// local addresses are added with bindx, extra peer addresses with
/// connectx. After a multi-peer connectx the default send destination is
/// the second peer address, so a downed primary does not pin sends to an
/// unreachable path.
pub fn dial_multi(
    network: &str,
    laddr: Option<&SctpMultiAddr>,
    raddr: &SctpMultiAddr,
) -> Result<SctpConn> {
    let wrap = |cause| Error::op("dial", network, None, Some(raddr.to_string()), cause);
    let net = Network::parse(network).map_err(&wrap)?;
    if raddr.is_empty() {
        return Err(wrap(Error::MissingAddress));
    }
    validate_multi(net, &raddr.addrs, false).map_err(&wrap)?;
    if let Some(laddr) = laddr {
        if !laddr.is_empty() {
            validate_multi(net, &laddr.addrs, true).map_err(&wrap)?;
        }
    }

    let primary_local = laddr.and_then(SctpMultiAddr::first);
    let mut conn = dial(network, primary_local, &raddr.addrs[0])?;
    conn.multi_peer = Some(raddr.addrs.clone());

    if let Some(laddr) = laddr {
        if laddr.len() > 1 {
            let bound_port = conn.local_addr()?.port;
            let mut extras: Vec<SctpAddr> = laddr.addrs[1..].to_vec();
            for extra in &mut extras {
                if extra.port == 0 {
                    extra.port = bound_port;
                }
            }
            // On failure the connection is dropped here, closing the
            // half-configured socket.
            conn.sock.bind_addrs(&extras).map_err(&wrap)?;
            let mut full = Vec::with_capacity(extras.len() + 1);
            full.push(conn.local_addr()?);
            full.extend(extras);
            conn.multi_local = Some(full);
        }
    }

    if raddr.len() > 1 {
        let assoc_id = conn.sock.connect_addrs(&raddr.addrs).map_err(&wrap)?;
        conn.assoc_id = Some(assoc_id);
        conn.default_peer = Some(raddr.addrs[1].clone());
    }
    Ok(conn)
}

/// Listen for SCTP messages on `laddr` (wildcard when absent).
pub fn listen(network: &str, laddr: Option<&SctpAddr>) -> Result<SctpConn> {
    let wrap = |cause| {
        Error::op(
            "listen",
            network,
            laddr.cloned(),
            None,
            cause,
        )
    };
    let net = Network::parse(network).map_err(&wrap)?;
    let family = socket_family(net, laddr, None);
    let sock = SysSocket::open(family, laddr, true).map_err(&wrap)?;
    let multi_local = sock.local_addr().ok().map(|a| vec![a]);
    Ok(SctpConn {
        sock,
        net,
        multi_local,
        multi_peer: None,
        default_peer: None,
        assoc_id: None,
    })
}

/// Listen on a multi-homed local endpoint.
///
/// The primary address is bound first; zero ports on the remaining
/// addresses are patched to the bound port before they are added with
/// bindx.
pub fn listen_multi(network: &str, laddr: Option<&SctpMultiAddr>) -> Result<SctpConn> {
    let wrap = |cause| Error::op("listen", network, None, None, cause);
    let net = Network::parse(network).map_err(&wrap)?;
    if let Some(laddr) = laddr {
        if !laddr.is_empty() {
            validate_multi(net, &laddr.addrs, true).map_err(&wrap)?;
        }
    }

    let primary = laddr.and_then(SctpMultiAddr::first);
    let mut conn = listen(network, primary)?;

    if let Some(laddr) = laddr {
        if laddr.len() > 1 {
            let bound_port = conn.local_addr()?.port;
            let mut extras: Vec<SctpAddr> = laddr.addrs[1..].to_vec();
            for extra in &mut extras {
                if extra.port == 0 {
                    extra.port = bound_port;
                }
            }
            conn.sock.bind_addrs(&extras).map_err(&wrap)?;
            let mut full = Vec::with_capacity(extras.len() + 1);
            full.push(conn.local_addr()?);
            full.extend(extras);
            conn.multi_local = Some(full);
        }
    }
    Ok(conn)
}

/// [`listen`] plus init-option configuration; the socket is closed when
/// configuration fails.
pub fn listen_init(
    network: &str,
    laddr: Option<&SctpAddr>,
    opts: &InitOptions,
) -> Result<SctpConn> {
    let conn = listen(network, laddr)?;
    conn.set_init_options(opts)?;
    Ok(conn)
}

/// [`listen_multi`] plus init-option configuration; the socket is closed
/// when configuration fails.
pub fn listen_multi_init(
    network: &str,
    laddr: Option<&SctpMultiAddr>,
    opts: &InitOptions,
) -> Result<SctpConn> {
    let conn = listen_multi(network, laddr)?;
    conn.set_init_options(opts)?;
    Ok(conn)
}

fn socket_family(
    net: Network,
    laddr: Option<&SctpAddr>,
    raddr: Option<&SctpAddr>,
) -> AddrFamily {
    match net {
        Network::V4 => AddrFamily::V4,
        Network::V6 => AddrFamily::V6,
        Network::Any => raddr
            .or(laddr)
            .map(SctpAddr::family)
            .unwrap_or(AddrFamily::V4),
    }
}
