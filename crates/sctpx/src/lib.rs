//! Message-oriented kernel SCTP sockets with multi-homing, for tokio.
//!
//! This crate wraps the Linux kernel's SCTP implementation in a typed,
//! message-oriented connection API:
//!
//! - per-message metadata (stream id, PPID, flags, context, association
//!   id) carried through `sendmsg`/`recvmsg` ancillary data;
//! - multi-homed associations across several local and/or peer addresses
//!   (bindx/connectx), with validated address lists;
//! - init parameters, NODELAY, and per-kind event subscriptions;
//! - typed errors carrying operation, network, and address context.
//!
//! See the [`sctp`] module for the full API and examples. On platforms
//! without kernel SCTP every operation fails with
//! [`Error::Unsupported`](sctp::Error::Unsupported).

pub mod sctp;

pub use sctp::{
    dial, dial_multi, listen, listen_init, listen_multi, listen_multi_init, resolve_addr,
    resolve_multi_addr, AddrFamily, Error, Event, EventMask, InitOptions, OpError, RecvInfo,
    RecvMsg, Result, SctpAddr, SctpConn, SctpMultiAddr, SendInfo, MSG_EOR, MSG_NOTIFICATION,
};
