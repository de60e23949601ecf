//! Wire-level error taxonomy, see HiSLIP spec table 6 and table 7.

use std::fmt;

/// Error codes carried by a `FatalError` message (type 2).
///
/// Receiving or locally detecting one of these means the session is
/// unusable; both channels must be closed and the connection re-established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalErrorCode {
    UnidentifiedError,
    PoorlyFormattedMessageHeader,
    AttemptUseWithoutBothChannels,
    InvalidInitialization,
    MaximumClientsExceeded,
    /// 5..127, reserved for HiSLIP extensions
    Extension(u8),
    /// 128..255, device-defined
    DeviceDefined(u8),
}

impl FatalErrorCode {
    pub fn code(&self) -> u8 {
        match self {
            FatalErrorCode::UnidentifiedError => 0,
            FatalErrorCode::PoorlyFormattedMessageHeader => 1,
            FatalErrorCode::AttemptUseWithoutBothChannels => 2,
            FatalErrorCode::InvalidInitialization => 3,
            FatalErrorCode::MaximumClientsExceeded => 4,
            FatalErrorCode::Extension(x) => *x,
            FatalErrorCode::DeviceDefined(x) => *x,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => FatalErrorCode::UnidentifiedError,
            1 => FatalErrorCode::PoorlyFormattedMessageHeader,
            2 => FatalErrorCode::AttemptUseWithoutBothChannels,
            3 => FatalErrorCode::InvalidInitialization,
            4 => FatalErrorCode::MaximumClientsExceeded,
            5..=127 => FatalErrorCode::Extension(code),
            _ => FatalErrorCode::DeviceDefined(code),
        }
    }
}

impl fmt::Display for FatalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalErrorCode::UnidentifiedError => write!(f, "unidentified error"),
            FatalErrorCode::PoorlyFormattedMessageHeader => {
                write!(f, "poorly formed message header")
            }
            FatalErrorCode::AttemptUseWithoutBothChannels => {
                write!(f, "attempt to use connection without both channels established")
            }
            FatalErrorCode::InvalidInitialization => write!(f, "invalid initialization sequence"),
            FatalErrorCode::MaximumClientsExceeded => {
                write!(f, "maximum number of clients exceeded")
            }
            FatalErrorCode::Extension(x) => write!(f, "extension error {x}"),
            FatalErrorCode::DeviceDefined(x) => write!(f, "device-defined error {x}"),
        }
    }
}

/// Error codes carried by a recoverable `Error` message (type 3).
///
/// The connection is left open; the caller may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonFatalErrorCode {
    UnidentifiedError,
    UnrecognizedMessageType,
    UnrecognizedControlCode,
    UnrecognizedVendorDefinedMessage,
    MessageTooLarge,
    /// 5..127, reserved for HiSLIP extensions
    Extension(u8),
    /// 128..255, device-defined
    DeviceDefined(u8),
}

impl NonFatalErrorCode {
    pub fn code(&self) -> u8 {
        match self {
            NonFatalErrorCode::UnidentifiedError => 0,
            NonFatalErrorCode::UnrecognizedMessageType => 1,
            NonFatalErrorCode::UnrecognizedControlCode => 2,
            NonFatalErrorCode::UnrecognizedVendorDefinedMessage => 3,
            NonFatalErrorCode::MessageTooLarge => 4,
            NonFatalErrorCode::Extension(x) => *x,
            NonFatalErrorCode::DeviceDefined(x) => *x,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => NonFatalErrorCode::UnidentifiedError,
            1 => NonFatalErrorCode::UnrecognizedMessageType,
            2 => NonFatalErrorCode::UnrecognizedControlCode,
            3 => NonFatalErrorCode::UnrecognizedVendorDefinedMessage,
            4 => NonFatalErrorCode::MessageTooLarge,
            5..=127 => NonFatalErrorCode::Extension(code),
            _ => NonFatalErrorCode::DeviceDefined(code),
        }
    }
}

impl fmt::Display for NonFatalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonFatalErrorCode::UnidentifiedError => write!(f, "unidentified error"),
            NonFatalErrorCode::UnrecognizedMessageType => write!(f, "unrecognized message type"),
            NonFatalErrorCode::UnrecognizedControlCode => write!(f, "unrecognized control code"),
            NonFatalErrorCode::UnrecognizedVendorDefinedMessage => {
                write!(f, "unrecognized vendor defined message")
            }
            NonFatalErrorCode::MessageTooLarge => write!(f, "message too large"),
            NonFatalErrorCode::Extension(x) => write!(f, "extension error {x}"),
            NonFatalErrorCode::DeviceDefined(x) => write!(f, "device-defined error {x}"),
        }
    }
}

/// An in-band HiSLIP error, either detected locally while decoding a frame
/// or observed as a `FatalError`/`Error` message received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WireError {
    Fatal(FatalErrorCode, String),
    NonFatal(NonFatalErrorCode, String),
}

impl WireError {
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(self, WireError::Fatal(..))
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Fatal(code, msg) => write!(f, "fatal error ({code}): {msg}"),
            WireError::NonFatal(code, msg) => write!(f, "error ({code}): {msg}"),
        }
    }
}

impl std::error::Error for WireError {}
