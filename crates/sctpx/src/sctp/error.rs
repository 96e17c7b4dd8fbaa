//! Error types for SCTP operations.

use std::fmt;
use std::io;

use super::addr::SctpAddr;

/// Result type for SCTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during SCTP operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from resolution or socket setup.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An unsupported network token was supplied.
    #[error("unknown network {0:?}")]
    UnknownNetwork(String),

    /// A required endpoint address was absent.
    #[error("missing address")]
    MissingAddress,

    /// An address or multi-address list failed validation.
    #[error("{reason}: {addr}")]
    Addr {
        /// Why the address was rejected.
        reason: &'static str,
        /// Rendering of the offending entry.
        addr: String,
    },

    /// An explicit destination was supplied on a connected socket.
    #[error("explicit destination on a connected socket")]
    WriteToConnected,

    /// The platform has no kernel SCTP support.
    #[error("sctp is not supported on this platform")]
    Unsupported,

    /// A syscall failed.
    #[error("{op}: {source}")]
    Syscall {
        /// The syscall that failed.
        op: &'static str,
        /// The underlying OS error.
        source: io::Error,
    },

    /// An SCTP_RCVINFO control message was present but truncated.
    #[error("short SCTP_RCVINFO control message: expected {expected} bytes, got {actual}")]
    ShortControlMessage {
        /// Expected payload length.
        expected: usize,
        /// Actual bytes present.
        actual: usize,
    },

    /// Malformed data in a kernel response.
    #[error("invalid message: {0}")]
    InvalidMessage(&'static str),

    /// A failed operation with network and address context.
    #[error(transparent)]
    Op(Box<OpError>),
}

impl Error {
    /// Create a syscall error from the calling thread's errno.
    pub(crate) fn syscall(op: &'static str) -> Self {
        Self::Syscall {
            op,
            source: io::Error::last_os_error(),
        }
    }

    /// Create an address validation error for the offending entry.
    pub(crate) fn addr(reason: &'static str, addr: &SctpAddr) -> Self {
        Self::Addr {
            reason,
            addr: addr.to_string(),
        }
    }

    /// Wrap an error with operation context.
    pub(crate) fn op(
        op: &'static str,
        net: &str,
        source: Option<SctpAddr>,
        addr: Option<String>,
        cause: Error,
    ) -> Self {
        Self::Op(Box::new(OpError {
            op,
            net: net.to_string(),
            source,
            addr,
            cause,
        }))
    }

    /// The innermost error, unwrapping any operation context.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Op(op) => op.cause.root_cause(),
            other => other,
        }
    }

    /// OS errno of the underlying syscall failure, if any.
    pub fn errno(&self) -> Option<i32> {
        match self.root_cause() {
            Self::Syscall { source, .. } => source.raw_os_error(),
            Self::Io(err) => err.raw_os_error(),
            _ => None,
        }
    }

    /// Check for the unsupported-platform error.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.root_cause(), Self::Unsupported)
    }
}

/// Context for a failed dial/listen/read/write/set operation.
///
/// Carries the network token plus the local and remote endpoints involved,
/// so a failure can be attributed without consulting surrounding code.
#[derive(Debug)]
pub struct OpError {
    /// Operation name ("dial", "listen", "read", "write", "set", "get").
    pub op: &'static str,
    /// Network token in effect.
    pub net: String,
    /// Local endpoint, when known.
    pub source: Option<SctpAddr>,
    /// Remote endpoint rendering, when known.
    pub addr: Option<String>,
    /// The underlying error.
    pub cause: Error,
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.net)?;
        if let Some(source) = &self.source {
            write!(f, " {source}")?;
        }
        if let Some(addr) = &self.addr {
            if self.source.is_some() {
                write!(f, " ->")?;
            }
            write!(f, " {addr}")?;
        }
        write!(f, ": {}", self.cause)
    }
}

impl std::error::Error for OpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
