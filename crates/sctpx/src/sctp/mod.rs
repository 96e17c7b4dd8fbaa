//! Kernel SCTP (RFC 4960) sockets with per-message metadata and
//! multi-homing.
//!
//! Connections ride one-to-many SEQPACKET sockets on the kernel's SCTP
//! stack. Every send and receive carries optional per-message metadata
//! (stream, PPID, context, association id) through ancillary control
//! data, and associations can span several local and peer addresses of
//! one family and port.
//!
//! # Quick start
//!
//! ```ignore
//! use sctpx::{dial, listen, InitOptions, SendInfo};
//!
//! let srv = listen("sctp4", Some(&"127.0.0.1:0".parse::<std::net::SocketAddr>()?.into()))?;
//! srv.set_init_options(&InitOptions { num_ostreams: 8, max_instreams: 8, ..Default::default() })?;
//!
//! let cli = dial("sctp4", None, &srv.local_addr()?)?;
//! let info = SendInfo { stream: 2, ppid: 42, ..Default::default() };
//! cli.send_msg(b"hello", None, Some(&info)).await?;
//!
//! let mut buf = vec![0u8; 1024];
//! loop {
//!     let msg = srv.recv_msg(&mut buf).await?;
//!     if msg.is_notification() {
//!         continue; // stack event, not user data
//!     }
//!     println!("{:?} from {:?}", &buf[..msg.len], msg.from);
//!     break;
//! }
//! ```
//!
//! # Multi-homing
//!
//! [`dial_multi`]/[`listen_multi`] take ordered address lists: the first
//! entry drives the initial bind/connect, the rest are added with
//! bindx/connectx. After a multi-peer connectx the default send
//! destination is the second entry, so a downed primary path does not pin
//! sends to an unreachable address.
//!
//! # Platform support
//!
//! Linux only; every operation on other platforms returns
//! [`Error::Unsupported`].

pub mod addr;
mod connection;
mod error;
mod sys;
pub mod types;

pub use addr::{resolve_addr, resolve_multi_addr, AddrFamily, SctpAddr, SctpMultiAddr};
pub use connection::{
    dial, dial_multi, listen, listen_init, listen_multi, listen_multi_init, SctpConn,
};
pub use error::{Error, OpError, Result};
pub use types::{
    Event, EventMask, InitOptions, RecvInfo, RecvMsg, SendInfo, MSG_EOR, MSG_NOTIFICATION,
};
