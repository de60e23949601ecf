//! Buffered, timed reads and serialized writes over one TCP channel.
//!
//! One `Channel` backs the synchronous socket, another the asynchronous
//! one; see spec §4.2 and §5 (Concurrency & Resource Model).

use std::net::SocketAddr;
use std::time::Duration;

use async_std::net::TcpStream;
use async_std::sync::Mutex;

use crate::common::errors::WireError;
use crate::common::message::Message;
use crate::error::ClientError;

pub(crate) struct Channel {
    // Cloned TcpStreams share the underlying socket (same fd); splitting
    // the read and write sides this way lets a write proceed while a
    // concurrent read blocks, without risking the two interleaving bytes
    // of the same logical frame.
    write: Mutex<TcpStream>,
    read: Mutex<TcpStream>,
    timeout: Mutex<Duration>,
    peer: SocketAddr,
}

impl Channel {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr, timeout: Duration) -> Self {
        Self {
            write: Mutex::new(stream.clone()),
            read: Mutex::new(stream),
            timeout: Mutex::new(timeout),
            peer,
        }
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) async fn set_timeout(&self, timeout: Duration) {
        *self.timeout.lock().await = timeout;
    }

    pub(crate) async fn send(&self, msg: &Message) -> Result<(), ClientError> {
        let mut w = self.write.lock().await;
        msg.write_to(&mut *w).await.map_err(ClientError::from)
    }

    /// Read one message, bounded by the configured socket timeout. Returns
    /// the outer `Err` only for transport failures (including timeout);
    /// the inner `Result` carries a locally-detected codec fault (bad
    /// header, oversized payload) distinct from a successfully decoded
    /// message.
    pub(crate) async fn recv(&self, max_len: u64) -> Result<Result<Message, WireError>, ClientError> {
        let timeout = *self.timeout.lock().await;
        self.recv_within(max_len, timeout).await
    }

    /// Read one message within an explicit deadline, overriding the
    /// configured socket timeout for this call only. `ask` uses this to
    /// apply its own `wait_ms` to the first frame of a response while
    /// later fragments of the same response fall back to the configured
    /// per-read timeout.
    pub(crate) async fn recv_within(
        &self,
        max_len: u64,
        timeout: Duration,
    ) -> Result<Result<Message, WireError>, ClientError> {
        let mut r = self.read.lock().await;
        match async_std::future::timeout(timeout, Message::read_from(&mut *r, max_len)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(io_err)) => Err(ClientError::Io(io_err)),
            Err(_elapsed) => Err(ClientError::Timeout),
        }
    }

    /// Block with no timeout, used by the SRQ waiter which is specified to
    /// block indefinitely until a frame arrives or the channel is closed.
    pub(crate) async fn recv_forever(&self) -> Result<Result<Message, WireError>, ClientError> {
        let mut r = self.read.lock().await;
        Message::read_from(&mut *r, u64::MAX)
            .await
            .map_err(ClientError::from)
    }

    pub(crate) async fn close(&self) -> Result<(), ClientError> {
        use async_std::io::WriteExt;
        let mut w = self.write.lock().await;
        w.close().await.map_err(ClientError::from)
    }
}
