//! Per-connection state, see spec §4.3.

use crate::common::message::{Message, MessageType};

/// The reserved id a server may echo when it has nothing recorded for an
/// exchange; only acceptable from `ask` while synchronized.
pub(crate) const UNKNOWN_MESSAGE_ID: u32 = 0xFFFFFFFF;
/// First id a freshly connected (or cleared) session uses.
pub(crate) const INITIAL_MESSAGE_ID: u32 = 0xFFFFFF00;
/// Smallest negotiable `maximum_message_size`: a 256-byte VISA payload plus
/// the 16-byte header.
pub const MINIMUM_MAX_MESSAGE_SIZE: u64 = 272;
/// `maximum_message_size` in effect until `set_max_message_size` is called.
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = MINIMUM_MAX_MESSAGE_SIZE;
/// Default socket timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
/// Default lock-acquisition timeout communicated to the server.
pub const DEFAULT_LOCK_TIMEOUT_MS: u32 = 3000;

#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) session_id: u16,
    pub(crate) negotiated_protocol: u16,
    pub(crate) overlap_mode: bool,
    pub(crate) client_message_id: u32,
    pub(crate) most_recent_message_id: u32,
    pub(crate) rmt_delivered: bool,
    pub(crate) maximum_message_size: u64,
    pub(crate) lock_timeout_ms: u32,
}

impl SessionState {
    pub(crate) fn new(session_id: u16, negotiated_protocol: u16, overlap_mode: bool) -> Self {
        Self {
            session_id,
            negotiated_protocol,
            overlap_mode,
            client_message_id: INITIAL_MESSAGE_ID,
            most_recent_message_id: 0,
            rmt_delivered: false,
            maximum_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Return the id to stamp on the next outbound Data/DataEnd/Trigger
    /// frame, then advance the counter by 2 modulo 2^32. `wrapping_add`
    /// keeps every produced id even relative to `INITIAL_MESSAGE_ID`, so
    /// `UNKNOWN_MESSAGE_ID` (odd) is never produced.
    pub(crate) fn next_message_id(&mut self) -> u32 {
        let id = self.client_message_id;
        self.client_message_id = self.client_message_id.wrapping_add(2);
        self.most_recent_message_id = id;
        id
    }

    /// `AsyncLock` release uses message id 0 whenever `most_recent_message_id`
    /// is still at its initial value, matching the original client's
    /// behaviour (the standard is silent on this case): this covers both no
    /// writes having occurred yet, and exactly one prior write (whose id was
    /// `INITIAL_MESSAGE_ID`).
    pub(crate) fn release_message_id(&self) -> u32 {
        if self.most_recent_message_id == INITIAL_MESSAGE_ID {
            0
        } else {
            self.most_recent_message_id
        }
    }

    pub(crate) fn reset_after_device_clear(&mut self) {
        self.client_message_id = INITIAL_MESSAGE_ID;
        self.most_recent_message_id = 0;
        self.rmt_delivered = false;
    }

    /// Whether an inbound Data/DataEnd `message_parameter` belongs to the
    /// most recent outbound exchange (or is the unknown-id sentinel, only
    /// acceptable while synchronized).
    pub(crate) fn accepts_response_id(&self, parameter: u32) -> bool {
        parameter == self.most_recent_message_id
            || (!self.overlap_mode && parameter == UNKNOWN_MESSAGE_ID)
    }

    /// RMT-delivered: set true only by an inbound `DataEnd` whose payload
    /// ends in a newline; any other inbound frame clears it. This mirrors
    /// the original client re-evaluating the flag on every received
    /// message, on either channel, rather than clearing it on send.
    pub(crate) fn observe_rmt(&mut self, msg: &Message) {
        self.rmt_delivered = matches!(msg.message_type, MessageType::DataEnd)
            && msg.payload.last() == Some(&b'\n');
    }

    pub(crate) fn rmt_control_byte(&self) -> u8 {
        self.rmt_delivered as u8
    }
}
