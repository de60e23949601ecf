//! Error kinds surfaced to application code, see spec §7.

use std::fmt;

use crate::common::errors::{FatalErrorCode, NonFatalErrorCode};

/// Outcome of an `AsyncLock` request, decoded from `AsyncLockResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Success,
    /// The client already held the exclusive lock.
    AlreadyExclusive,
}

/// Outcome of releasing a previously held lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    SuccessExclusive,
    SuccessShared,
}

/// Every way a client operation can fail.
#[derive(Debug)]
pub enum ClientError {
    /// A `FatalError` message was received or locally detected. The session
    /// has been torn down; the client attempted (but does not guarantee) an
    /// automatic reconnect to the remembered peer.
    Fatal(FatalErrorCode, String),
    /// A recoverable `Error` message was received or locally detected. Both
    /// channels remain open.
    Protocol(NonFatalErrorCode, String),
    /// No response arrived within the configured window.
    Timeout,
    /// `request_lock` was refused (`AsyncLockResponse` control code 0).
    Lock,
    /// An underlying socket operation failed.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Fatal(code, msg) => write!(f, "fatal protocol error ({code}): {msg}"),
            ClientError::Protocol(code, msg) => write!(f, "protocol error ({code}): {msg}"),
            ClientError::Timeout => write!(f, "timed out waiting for a response"),
            ClientError::Lock => write!(f, "lock request was refused"),
            ClientError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err)
    }
}
