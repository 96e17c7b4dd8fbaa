//! Platform dispatch for the kernel SCTP surface.
//!
//! Linux gets the real implementation; everywhere else gets a stub whose
//! operations fail with `Error::Unsupported`.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub(crate) use linux::SysSocket;

#[cfg(not(target_os = "linux"))]
mod unsupported;
#[cfg(not(target_os = "linux"))]
pub(crate) use unsupported::SysSocket;
