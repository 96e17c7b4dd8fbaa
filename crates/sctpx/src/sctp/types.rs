//! Per-message metadata and socket configuration types.

use super::addr::SctpAddr;

/// Flag set in [`RecvMsg::flags`] when the payload is a stack notification
/// rather than a user message.
pub const MSG_NOTIFICATION: i32 = 0x8000;

/// End-of-record flag; set on every complete SEQPACKET message.
pub const MSG_EOR: i32 = 0x80;

/// Per-message metadata attached to sends (`SCTP_SNDINFO`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendInfo {
    /// Stream the message is sent on.
    pub stream: u16,
    /// SCTP send flag bits.
    pub flags: u16,
    /// Payload protocol identifier; opaque to the stack.
    pub ppid: u32,
    /// Opaque value reported back on send failures.
    pub context: u32,
    /// Target association on a one-to-many socket; 0 selects the default.
    pub assoc_id: i32,
}

/// Per-message metadata delivered with receives (`SCTP_RCVINFO`).
///
/// Populated only after receive-info delivery has been enabled, which
/// [`SctpConn::set_init_options`](super::SctpConn::set_init_options) does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecvInfo {
    /// Stream the message arrived on.
    pub stream: u16,
    /// Stream sequence number.
    pub ssn: u16,
    /// SCTP receive flag bits.
    pub flags: u16,
    /// Payload protocol identifier chosen by the sender.
    pub ppid: u32,
    /// Transmission sequence number.
    pub tsn: u32,
    /// Cumulative transmission sequence number.
    pub cum_tsn: u32,
    /// Sender-supplied context.
    pub context: u32,
    /// Association the message belongs to.
    pub assoc_id: i32,
}

/// Association setup parameters (`SCTP_INITMSG`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// Number of outgoing streams requested.
    pub num_ostreams: u16,
    /// Maximum number of incoming streams accepted.
    pub max_instreams: u16,
    /// Maximum INIT retransmission attempts.
    pub max_attempts: u16,
    /// Largest INIT retransmission timeout, in milliseconds.
    pub max_init_timeout: u16,
}

/// The SCTP event kinds that can be subscribed to (`SCTP_EVENT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    DataIo,
    Association,
    Address,
    SendFailure,
    PeerError,
    Shutdown,
    PartialDelivery,
    Adaptation,
    Authentication,
    SenderDry,
    StreamReset,
}

impl Event {
    /// Every event kind, in kernel identifier order.
    pub const ALL: [Event; 11] = [
        Event::DataIo,
        Event::Association,
        Event::Address,
        Event::SendFailure,
        Event::PeerError,
        Event::Shutdown,
        Event::PartialDelivery,
        Event::Adaptation,
        Event::Authentication,
        Event::SenderDry,
        Event::StreamReset,
    ];

    /// Kernel identifier for this event kind.
    pub fn kind_id(self) -> u16 {
        match self {
            Event::DataIo => 0x8000,
            Event::Association => 0x8001,
            Event::Address => 0x8002,
            Event::SendFailure => 0x8003,
            Event::PeerError => 0x8004,
            Event::Shutdown => 0x8005,
            Event::PartialDelivery => 0x8006,
            Event::Adaptation => 0x8007,
            Event::Authentication => 0x8008,
            Event::SenderDry => 0x8009,
            Event::StreamReset => 0x800a,
        }
    }
}

/// Subscription switches for the eleven SCTP event kinds.
///
/// Each enabled kind is applied with its own `setsockopt`; a failure aborts
/// the sequence without rolling back kinds already applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventMask {
    pub data_io: bool,
    pub association: bool,
    pub address: bool,
    pub send_failure: bool,
    pub peer_error: bool,
    pub shutdown: bool,
    pub partial_delivery: bool,
    pub adaptation: bool,
    pub authentication: bool,
    pub sender_dry: bool,
    pub stream_reset: bool,
}

impl EventMask {
    pub(crate) fn enabled(&self, event: Event) -> bool {
        match event {
            Event::DataIo => self.data_io,
            Event::Association => self.association,
            Event::Address => self.address,
            Event::SendFailure => self.send_failure,
            Event::PeerError => self.peer_error,
            Event::Shutdown => self.shutdown,
            Event::PartialDelivery => self.partial_delivery,
            Event::Adaptation => self.adaptation,
            Event::Authentication => self.authentication,
            Event::SenderDry => self.sender_dry,
            Event::StreamReset => self.stream_reset,
        }
    }
}

/// One received SCTP message with its metadata.
#[derive(Debug, Clone)]
pub struct RecvMsg {
    /// Payload length written into the caller's buffer.
    pub len: usize,
    /// The `recvmsg` flags word.
    pub flags: i32,
    /// Kernel-reported source address.
    pub from: Option<SctpAddr>,
    /// Parsed receive metadata, when delivery is enabled.
    pub info: Option<RecvInfo>,
}

impl RecvMsg {
    /// True when this message is a stack notification rather than user
    /// data; callers should skip it and read again.
    pub fn is_notification(&self) -> bool {
        self.flags & MSG_NOTIFICATION != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids_are_contiguous_in_order() {
        for (i, event) in Event::ALL.iter().enumerate() {
            assert_eq!(event.kind_id(), 0x8000 + i as u16);
        }
    }

    #[test]
    fn test_event_mask_switches() {
        let mask = EventMask {
            association: true,
            shutdown: true,
            ..Default::default()
        };
        assert!(mask.enabled(Event::Association));
        assert!(mask.enabled(Event::Shutdown));
        assert!(!mask.enabled(Event::DataIo));
        assert!(!mask.enabled(Event::StreamReset));
    }

    #[test]
    fn test_notification_flag() {
        let msg = RecvMsg {
            len: 0,
            flags: MSG_NOTIFICATION | MSG_EOR,
            from: None,
            info: None,
        };
        assert!(msg.is_notification());

        let msg = RecvMsg {
            len: 4,
            flags: MSG_EOR,
            from: None,
            info: None,
        };
        assert!(!msg.is_notification());
    }
}
