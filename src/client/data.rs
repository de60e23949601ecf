//! `write` and `ask`, see spec §4.5.

use std::time::Duration;

use crate::common::errors::NonFatalErrorCode;
use crate::common::message::{Message, MessageType};
use crate::error::ClientError;

use super::Client;

impl Client {
    /// Send `payload` on the synchronous channel, fragmented into frames of
    /// at most `maximum_message_size - 16` bytes. A trailing newline is
    /// appended if the caller didn't provide one; every fragment but the
    /// last goes out as `Data`, the last as `DataEnd`.
    pub async fn write(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        let mut buf = payload.to_vec();
        if buf.last() != Some(&b'\n') {
            buf.push(b'\n');
        }

        let limit = (self.state.maximum_message_size.saturating_sub(Message::HEADER_SIZE as u64))
            .max(1) as usize;
        let control = self.state.rmt_control_byte();

        let chunks: Vec<&[u8]> = buf.chunks(limit).collect();
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.into_iter().enumerate() {
            let id = self.state.next_message_id();
            let message_type = if i == last { MessageType::DataEnd } else { MessageType::Data };
            self.sync
                .send(&message_type.params(control, id).with_payload(chunk.to_vec()))
                .await?;
        }
        Ok(())
    }

    /// `write(payload)` then collect the matching `Data*`/`DataEnd`
    /// sequence. The first frame of the response is awaited up to
    /// `wait_ms`; later fragments of the same response use the channel's
    /// regular configured timeout. A response for a stale message id is
    /// not an error: it yields an empty buffer (see spec §7).
    pub async fn ask(&mut self, payload: &[u8], wait_ms: u64) -> Result<Vec<u8>, ClientError> {
        self.write(payload).await?;

        let mut assembled = Vec::new();
        let mut deadline = Some(Duration::from_millis(wait_ms));

        loop {
            let msg = match deadline.take() {
                Some(timeout) => self.recv_on_sync_within(timeout).await?,
                None => self.recv_on_sync().await?,
            };

            if !self.state.accepts_response_id(msg.message_parameter) {
                return Ok(Vec::new());
            }

            match msg.message_type {
                MessageType::Data => assembled.extend_from_slice(&msg.payload),
                MessageType::DataEnd => {
                    assembled.extend_from_slice(&msg.payload);
                    return Ok(assembled);
                }
                other => {
                    return Err(ClientError::Protocol(
                        NonFatalErrorCode::UnrecognizedMessageType,
                        format!("unexpected message type {other:?} while assembling ask response"),
                    ))
                }
            }
        }
    }
}
