//! The client connection: handshake, teardown and the shared request/response
//! plumbing `data`, `control` and `srq` build on. See spec §4.1-§4.3.

pub(crate) mod channel;
pub(crate) mod control;
pub(crate) mod data;
mod session;
pub(crate) mod srq;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_std::net::{TcpStream, ToSocketAddrs};
use byteorder::{ByteOrder, NetworkEndian};

use crate::common::errors::{FatalErrorCode, WireError};
use crate::common::message::{
    InitializeParameter, InitializeResponseControl, InitializeResponseParameter, Message,
    MessageType,
};
use crate::common::{protocol_major, protocol_minor, SUPPORTED_PROTOCOL};
use crate::error::ClientError;

use channel::Channel;
use session::SessionState;
use srq::Srq;

pub use session::{
    DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_TIMEOUT_MS,
    MINIMUM_MAX_MESSAGE_SIZE,
};

/// `hislip0`, the only sub-address this client asks for.
pub const DEFAULT_SUB_ADDRESS: &str = "hislip0";
/// Registered TCP port for the HiSLIP protocol.
pub const STANDARD_PORT: u16 = 4880;

/// A connected HiSLIP client session, holding both the synchronous and
/// asynchronous channels. See spec §4.1 (Component Design) and §5
/// (Concurrency & Resource Model).
pub struct Client {
    pub(crate) sync: Arc<Channel>,
    pub(crate) asynch: Arc<Channel>,
    pub(crate) state: SessionState,
    pub(crate) srq: Srq,
    vendor_id: u16,
    sub_address: String,
    peer: SocketAddr,
}

impl Client {
    /// Perform the full seven-step handshake described in spec §4.4: open
    /// the synchronous channel, `Initialize`; open the asynchronous
    /// channel, `AsyncInitialize`. `maximum_message_size` is left at its
    /// protocol minimum until `set_max_message_size` is called explicitly,
    /// matching the original client (it does not auto-negotiate during
    /// connect).
    pub async fn connect(
        addrs: impl ToSocketAddrs + Clone,
        vendor_id: u16,
        sub_address: &str,
    ) -> Result<Self, ClientError> {
        let sync_stream = TcpStream::connect(addrs.clone()).await?;
        let peer = sync_stream.peer_addr()?;
        let timeout = Duration::from_millis(DEFAULT_TIMEOUT_MS);
        let sync = Arc::new(Channel::new(sync_stream, peer, timeout));

        let mut init_param = InitializeParameter(0);
        init_param.set_protocol(SUPPORTED_PROTOCOL);
        init_param.set_vendor_id(vendor_id);
        sync.send(
            &MessageType::Initialize
                .params(0, init_param.0)
                .with_payload(sub_address.as_bytes().to_vec()),
        )
        .await?;

        let response = sync.recv(Message::HEADER_SIZE as u64 + 256).await?;
        let (overlap_mode, negotiated_protocol, session_id) = match response {
            Ok(Message {
                message_type: MessageType::InitializeResponse,
                control_code,
                message_parameter,
                ..
            }) => {
                let control = InitializeResponseControl(control_code);
                let parameter = InitializeResponseParameter(message_parameter);
                (control.prefer_overlap(), parameter.negotiated_protocol(), parameter.session_id())
            }
            Ok(other) => {
                return Err(ClientError::Fatal(
                    FatalErrorCode::InvalidInitialization,
                    format!("unexpected response to Initialize: {:?}", other.message_type),
                ))
            }
            Err(wire_err) => return Err(Self::wire_to_client_error(wire_err)),
        };

        log::debug!(
            peer = peer.to_string(), session_id = session_id, protocol = negotiated_protocol;
            "synchronous channel initialized, overlap_mode={}", overlap_mode
        );

        let asynch_stream = TcpStream::connect(addrs).await?;
        let asynch = Arc::new(Channel::new(asynch_stream, peer, timeout));
        asynch
            .send(&MessageType::AsyncInitialize.params(0, session_id as u32))
            .await?;

        match asynch.recv(Message::HEADER_SIZE as u64 + 256).await? {
            Ok(Message {
                message_type: MessageType::AsyncInitializeResponse,
                ..
            }) => {}
            Ok(other) => {
                return Err(ClientError::Fatal(
                    FatalErrorCode::InvalidInitialization,
                    format!("unexpected response to AsyncInitialize: {:?}", other.message_type),
                ))
            }
            Err(wire_err) => return Err(Self::wire_to_client_error(wire_err)),
        }

        log::debug!(peer = peer.to_string(), session_id = session_id; "asynchronous channel initialized");

        let state = SessionState::new(session_id, negotiated_protocol, overlap_mode);
        Ok(Self {
            sync,
            asynch,
            state,
            srq: Srq::new(),
            vendor_id,
            sub_address: sub_address.to_string(),
            peer,
        })
    }

    pub fn session_id(&self) -> u16 {
        self.state.session_id
    }

    pub fn overlap_mode(&self) -> bool {
        self.state.overlap_mode
    }

    pub fn negotiated_protocol(&self) -> (u8, u8) {
        (protocol_major(self.state.negotiated_protocol), protocol_minor(self.state.negotiated_protocol))
    }

    pub fn maximum_message_size(&self) -> u64 {
        self.state.maximum_message_size
    }

    pub fn rmt_delivered(&self) -> bool {
        self.state.rmt_delivered
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Apply a timeout to both channels. Governs `ask`'s `wait_ms` fallback
    /// and every other blocking read, per spec §4.7.
    pub async fn set_timeout(&self, timeout: Duration) {
        self.sync.set_timeout(timeout).await;
        self.asynch.set_timeout(timeout).await;
    }

    pub fn set_lock_timeout(&mut self, timeout_ms: u32) {
        self.state.lock_timeout_ms = timeout_ms;
    }

    /// Negotiate the largest payload either side will send in one frame.
    /// See spec §4.5; the wire value is the requested size, the response
    /// carries what the server is actually willing to accept.
    pub async fn set_max_message_size(&mut self, requested: u64) -> Result<u64, ClientError> {
        let requested = requested.max(MINIMUM_MAX_MESSAGE_SIZE);
        let mut buf = [0u8; 8];
        NetworkEndian::write_u64(&mut buf, requested);

        self.asynch
            .send(&MessageType::AsyncMaximumMessageSize.params(0, 0).with_payload(buf.to_vec()))
            .await?;

        match self.recv_on_async().await? {
            Message {
                message_type: MessageType::AsyncMaximumMessageSizeResponse,
                payload,
                ..
            } if payload.len() == 8 => {
                let server_value = NetworkEndian::read_u64(&payload);
                let effective = requested.min(server_value);
                self.state.maximum_message_size = effective;
                Ok(effective)
            }
            other => Err(ClientError::Protocol(
                crate::common::errors::NonFatalErrorCode::UnidentifiedError,
                format!("unexpected response to AsyncMaximumMessageSize: {:?}", other.message_type),
            )),
        }
    }

    /// Read one message from the synchronous channel, dispatching
    /// locally-detected and peer-reported faults per spec §4.7: a fault we
    /// detect while decoding is ours to report back to the peer; a fault
    /// the peer reports is theirs, nothing is sent in response.
    pub(crate) async fn recv_on_sync(&mut self) -> Result<Message, ClientError> {
        self.recv_on(true, None).await
    }

    pub(crate) async fn recv_on_async(&mut self) -> Result<Message, ClientError> {
        self.recv_on(false, None).await
    }

    /// As `recv_on_sync`, overriding the channel's configured timeout for
    /// this read only; `ask` uses this to apply `wait_ms` to the first
    /// frame of a response.
    pub(crate) async fn recv_on_sync_within(
        &mut self,
        timeout: Duration,
    ) -> Result<Message, ClientError> {
        self.recv_on(true, Some(timeout)).await
    }

    async fn recv_on(&mut self, sync: bool, timeout: Option<Duration>) -> Result<Message, ClientError> {
        let channel = if sync { &self.sync } else { &self.asynch };
        let max_len = self.state.maximum_message_size;

        let read = match timeout {
            Some(timeout) => channel.recv_within(max_len, timeout).await,
            None => channel.recv(max_len).await,
        };

        match read {
            Ok(Ok(msg)) => {
                self.state.observe_rmt(&msg);
                match msg.message_type {
                    MessageType::FatalError => {
                        let code = FatalErrorCode::from_code(msg.control_code);
                        let reason = String::from_utf8_lossy(&msg.payload).into_owned();
                        self.teardown_for_fatal().await;
                        Err(ClientError::Fatal(code, reason))
                    }
                    MessageType::Error => {
                        let code =
                            crate::common::errors::NonFatalErrorCode::from_code(msg.control_code);
                        let reason = String::from_utf8_lossy(&msg.payload).into_owned();
                        Err(ClientError::Protocol(code, reason))
                    }
                    _ => Ok(msg),
                }
            }
            Ok(Err(wire_err)) => {
                // We detected this fault; report it to the peer before
                // surfacing it, then tear down if it was fatal.
                let fatal = wire_err.is_fatal();
                let report: Message = wire_err.clone().into();
                let _ = channel.send(&report).await;
                let err = Self::wire_to_client_error(wire_err);
                if fatal {
                    self.teardown_for_fatal().await;
                }
                Err(err)
            }
            Err(ClientError::Timeout) => Err(ClientError::Timeout),
            Err(other) => {
                self.teardown_for_fatal().await;
                Err(other)
            }
        }
    }

    fn wire_to_client_error(err: WireError) -> ClientError {
        match err {
            WireError::Fatal(code, msg) => ClientError::Fatal(code, msg),
            WireError::NonFatal(code, msg) => ClientError::Protocol(code, msg),
        }
    }

    /// Close both channels after a fatal error and attempt a best-effort
    /// reconnect to the remembered peer, per spec §4.7 and §8 scenario 8.
    /// A failed reconnect attempt is swallowed: the caller already has the
    /// `ClientError::Fatal` that triggered this and may call `connect`
    /// again itself.
    async fn teardown_for_fatal(&mut self) {
        let _ = self.sync.close().await;
        let _ = self.asynch.close().await;
        self.srq.join().await;

        match Client::connect(self.peer, self.vendor_id, &self.sub_address).await {
            Ok(fresh) => {
                log::info!(peer = self.peer.to_string(); "reconnected after fatal error");
                self.sync = fresh.sync;
                self.asynch = fresh.asynch;
                self.state = fresh.state;
                self.srq = Srq::new();
            }
            Err(err) => {
                log::warn!(peer = self.peer.to_string(); "automatic reconnect after fatal error failed: {}", err);
            }
        }
    }

    /// Close both channels without attempting to reconnect.
    pub async fn close(self) -> Result<(), ClientError> {
        self.sync.close().await?;
        self.asynch.close().await?;
        Ok(())
    }
}
