//! A client implementation of the HiSLIP (IVI-6.1) transport: connection
//! establishment, framing, dual-channel coordination, message-id
//! sequencing, lock arbitration, SRQ handling, device clear and status
//! queries, exposed as a high-level client surface for applications
//! controlling test and measurement instruments over TCP.

pub mod client;
pub(crate) mod common;
pub mod error;

pub use client::{
    control::{LockInfo, RemoteLocalRequest},
    Client, DEFAULT_SUB_ADDRESS, STANDARD_PORT,
};
pub use common::errors::{FatalErrorCode, NonFatalErrorCode};
pub use common::SUPPORTED_PROTOCOL;
pub use error::{ClientError, LockOutcome, ReleaseOutcome};

/// Default vendor id advertised during `Initialize`, the two ASCII bytes
/// "ZL".
pub const DEFAULT_VENDOR_ID: u16 = u16::from_be_bytes([b'Z', b'L']);
