//! Shared helpers for integration tests.

use std::time::Duration;

use sctpx::{RecvMsg, SctpConn};
use tokio::time::timeout;

/// How long any single receive may take before the test fails.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Check whether the kernel exposes SCTP sockets.
#[cfg(target_os = "linux")]
pub fn sctp_available() -> bool {
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_SEQPACKET, libc::IPPROTO_SCTP) };
    if fd < 0 {
        return false;
    }
    unsafe { libc::close(fd) };
    true
}

#[cfg(not(target_os = "linux"))]
pub fn sctp_available() -> bool {
    false
}

/// Skip the test when kernel SCTP is unavailable (`modprobe sctp`).
#[macro_export]
macro_rules! require_sctp {
    () => {
        if !crate::common::sctp_available() {
            eprintln!("Skipping test: kernel SCTP unavailable");
            return;
        }
    };
}

/// Receive the next user message, skipping stack notifications.
pub async fn recv_user_msg(conn: &SctpConn, buf: &mut [u8]) -> RecvMsg {
    loop {
        let msg = timeout(RECV_TIMEOUT, conn.recv_msg(buf))
            .await
            .expect("receive timed out")
            .expect("receive failed");
        if !msg.is_notification() {
            return msg;
        }
    }
}
