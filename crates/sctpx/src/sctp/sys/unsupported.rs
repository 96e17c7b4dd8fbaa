//! Stub surface for platforms without kernel SCTP.
//!
//! The socket type is uninhabited: construction fails with
//! [`Error::Unsupported`], so every caller compiles and fails predictably.

use crate::sctp::addr::{AddrFamily, SctpAddr};
use crate::sctp::error::{Error, Result};
use crate::sctp::types::{EventMask, InitOptions, RecvMsg, SendInfo};

pub(crate) enum SysSocket {}

impl SysSocket {
    pub(crate) fn open(
        _family: AddrFamily,
        _laddr: Option<&SctpAddr>,
        _listen: bool,
    ) -> Result<Self> {
        Err(Error::Unsupported)
    }

    pub(crate) fn is_connected(&self) -> bool {
        match *self {}
    }

    pub(crate) fn local_addr(&self) -> Result<SctpAddr> {
        match *self {}
    }

    pub(crate) fn peer_addr(&self) -> Result<SctpAddr> {
        match *self {}
    }

    pub(crate) async fn recv_msg(&self, _buf: &mut [u8]) -> Result<RecvMsg> {
        match *self {}
    }

    pub(crate) async fn send_msg(
        &self,
        _buf: &[u8],
        _to: Option<&SctpAddr>,
        _info: Option<&SendInfo>,
    ) -> Result<usize> {
        match *self {}
    }

    pub(crate) fn set_nodelay(&self, _on: bool) -> Result<()> {
        match *self {}
    }

    pub(crate) fn set_init_options(&self, _opts: &InitOptions) -> Result<()> {
        match *self {}
    }

    pub(crate) fn subscribe_events(&self, _mask: &EventMask) -> Result<()> {
        match *self {}
    }

    pub(crate) fn bind_addrs(&self, _addrs: &[SctpAddr]) -> Result<()> {
        match *self {}
    }

    pub(crate) fn connect_addrs(&self, _addrs: &[SctpAddr]) -> Result<i32> {
        match *self {}
    }

    pub(crate) fn local_addrs(&self, _assoc_id: i32) -> Result<Vec<SctpAddr>> {
        match *self {}
    }

    pub(crate) fn peer_addrs(&self, _assoc_id: i32) -> Result<Vec<SctpAddr>> {
        match *self {}
    }
}
