//! The 16-byte HiSLIP frame header plus payload, and its wire codec.
//!
//! See HiSLIP IVI-6.1 table 4 for the message type assignments.

use std::io;

use bitfield::bitfield;
use byteorder::{BigEndian, ByteOrder, NetworkEndian};
use futures::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::{FatalErrorCode, NonFatalErrorCode, WireError};

/// Message Type Value Definitions, HiSLIP table 4.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum MessageType {
    Initialize,
    InitializeResponse,
    FatalError,
    Error,
    AsyncLock,
    AsyncLockResponse,
    Data,
    DataEnd,
    DeviceClearComplete,
    DeviceClearAcknowledge,
    AsyncRemoteLocalControl,
    AsyncRemoteLocalResponse,
    Trigger,
    Interrupted,
    AsyncInterrupted,
    AsyncMaximumMessageSize,
    AsyncMaximumMessageSizeResponse,
    AsyncInitialize,
    AsyncInitializeResponse,
    AsyncDeviceClear,
    AsyncServiceRequest,
    AsyncStatusQuery,
    AsyncStatusResponse,
    AsyncDeviceClearAcknowledge,
    AsyncLockInfo,
    AsyncLockInfoResponse,
    /// Vendor-specific, 128-255. Observed but never acted on by this client.
    VendorSpecific(u8),
}

impl MessageType {
    pub(crate) fn get_message_type(&self) -> u8 {
        match self {
            MessageType::Initialize => 0,
            MessageType::InitializeResponse => 1,
            MessageType::FatalError => 2,
            MessageType::Error => 3,
            MessageType::AsyncLock => 4,
            MessageType::AsyncLockResponse => 5,
            MessageType::Data => 6,
            MessageType::DataEnd => 7,
            MessageType::DeviceClearComplete => 8,
            MessageType::DeviceClearAcknowledge => 9,
            MessageType::AsyncRemoteLocalControl => 10,
            MessageType::AsyncRemoteLocalResponse => 11,
            MessageType::Trigger => 12,
            MessageType::Interrupted => 13,
            MessageType::AsyncInterrupted => 14,
            MessageType::AsyncMaximumMessageSize => 15,
            MessageType::AsyncMaximumMessageSizeResponse => 16,
            MessageType::AsyncInitialize => 17,
            MessageType::AsyncInitializeResponse => 18,
            MessageType::AsyncDeviceClear => 19,
            MessageType::AsyncServiceRequest => 20,
            MessageType::AsyncStatusQuery => 21,
            MessageType::AsyncStatusResponse => 22,
            MessageType::AsyncDeviceClearAcknowledge => 23,
            MessageType::AsyncLockInfo => 24,
            MessageType::AsyncLockInfoResponse => 25,
            MessageType::VendorSpecific(x) => *x,
        }
    }

    pub(crate) fn from_message_type(typ: u8) -> Option<MessageType> {
        Some(match typ {
            0 => MessageType::Initialize,
            1 => MessageType::InitializeResponse,
            2 => MessageType::FatalError,
            3 => MessageType::Error,
            4 => MessageType::AsyncLock,
            5 => MessageType::AsyncLockResponse,
            6 => MessageType::Data,
            7 => MessageType::DataEnd,
            8 => MessageType::DeviceClearComplete,
            9 => MessageType::DeviceClearAcknowledge,
            10 => MessageType::AsyncRemoteLocalControl,
            11 => MessageType::AsyncRemoteLocalResponse,
            12 => MessageType::Trigger,
            13 => MessageType::Interrupted,
            14 => MessageType::AsyncInterrupted,
            15 => MessageType::AsyncMaximumMessageSize,
            16 => MessageType::AsyncMaximumMessageSizeResponse,
            17 => MessageType::AsyncInitialize,
            18 => MessageType::AsyncInitializeResponse,
            19 => MessageType::AsyncDeviceClear,
            20 => MessageType::AsyncServiceRequest,
            21 => MessageType::AsyncStatusQuery,
            22 => MessageType::AsyncStatusResponse,
            23 => MessageType::AsyncDeviceClearAcknowledge,
            24 => MessageType::AsyncLockInfo,
            25 => MessageType::AsyncLockInfoResponse,
            128..=255 => MessageType::VendorSpecific(typ),
            _ => return None,
        })
    }

    /// Build a header-only message of this type, no payload.
    pub(crate) fn params(self, control_code: u8, message_parameter: u32) -> Message {
        Message {
            message_type: self,
            control_code,
            message_parameter,
            payload: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Message {
    pub(crate) message_type: MessageType,
    pub(crate) control_code: u8,
    pub(crate) message_parameter: u32,
    pub(crate) payload: Vec<u8>,
}

impl Message {
    pub(crate) const HEADER_SIZE: usize = 16;

    pub(crate) fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Parse and validate the 16-byte header, then read the payload it
    /// declares. `max_len` is the negotiated maximum message size; a
    /// payload_length beyond it is a recoverable `MessageTooLarge` error.
    pub(crate) async fn read_from<RD>(
        reader: &mut RD,
        max_len: u64,
    ) -> Result<Result<Message, WireError>, io::Error>
    where
        RD: AsyncRead + Unpin,
    {
        let mut buf = [0u8; Message::HEADER_SIZE];
        reader.read_exact(&mut buf).await?;

        if &buf[0..2] != b"HS" {
            return Ok(Err(WireError::Fatal(
                FatalErrorCode::PoorlyFormattedMessageHeader,
                "invalid prologue".to_string(),
            )));
        }

        let raw_type = buf[2];
        let control_code = buf[3];
        let message_parameter = BigEndian::read_u32(&buf[4..8]);
        let payload_length = BigEndian::read_u64(&buf[8..16]);

        if payload_length > max_len {
            // Still have to drain the bytes off the wire so the channel
            // stays in sync for the next header.
            let mut sink = reader.take(payload_length);
            let mut discard = Vec::new();
            let _ = sink.read_to_end(&mut discard).await;
            return Ok(Err(WireError::NonFatal(
                NonFatalErrorCode::MessageTooLarge,
                format!("payload of {payload_length} octets exceeds negotiated maximum {max_len}"),
            )));
        }

        let mut payload = Vec::with_capacity(payload_length as usize);
        reader.take(payload_length).read_to_end(&mut payload).await?;

        match MessageType::from_message_type(raw_type) {
            Some(message_type) => Ok(Ok(Message {
                message_type,
                control_code,
                message_parameter,
                payload,
            })),
            None => Ok(Err(WireError::NonFatal(
                NonFatalErrorCode::UnrecognizedMessageType,
                format!("unrecognized message type {raw_type}"),
            ))),
        }
    }

    pub(crate) async fn write_to<WR>(&self, writer: &mut WR) -> Result<(), io::Error>
    where
        WR: AsyncWrite + Unpin,
    {
        let mut buf = [0u8; Message::HEADER_SIZE];
        buf[0] = b'H';
        buf[1] = b'S';
        buf[2] = self.message_type.get_message_type();
        buf[3] = self.control_code;
        NetworkEndian::write_u32(&mut buf[4..8], self.message_parameter);
        NetworkEndian::write_u64(&mut buf[8..16], self.payload.len() as u64);

        writer.write_all(&buf).await?;
        if !self.payload.is_empty() {
            writer.write_all(&self.payload).await?;
        }
        writer.flush().await
    }
}

impl From<WireError> for Message {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Fatal(code, msg) => {
                MessageType::FatalError.params(code.code(), 0).with_payload(msg.into_bytes())
            }
            WireError::NonFatal(code, msg) => {
                MessageType::Error.params(code.code(), 0).with_payload(msg.into_bytes())
            }
        }
    }
}

bitfield! {
    /// `message_parameter` of `Initialize`: client protocol version and vendor id.
    #[derive(Copy, Clone)]
    pub(crate) struct InitializeParameter(u32);
    impl Debug;
    pub u16, protocol, set_protocol: 31, 16;
    pub u16, vendor_id, set_vendor_id: 15, 0;
}

bitfield! {
    /// `message_parameter` of `InitializeResponse`: negotiated protocol and session id.
    #[derive(Copy, Clone)]
    pub(crate) struct InitializeResponseParameter(u32);
    impl Debug;
    pub u16, negotiated_protocol, _: 31, 16;
    pub u16, session_id, _: 15, 0;
}

bitfield! {
    /// `message_parameter` of `AsyncInitializeResponse`: server vendor id.
    #[derive(Copy, Clone)]
    pub(crate) struct AsyncInitializeResponseParameter(u32);
    impl Debug;
    pub u16, server_vendor_id, _: 15, 0;
}

bitfield! {
    /// `control_code` of `InitializeResponse`.
    #[derive(Copy, Clone)]
    pub(crate) struct InitializeResponseControl(u8);
    impl Debug;
    pub prefer_overlap, _: 0;
    pub encryption_mandatory, _: 1;
}
