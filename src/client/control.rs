//! Status query, lock arbitration, device clear, trigger and remote/local,
//! see spec §4.6.

use crate::common::message::MessageType;
use crate::error::{ClientError, LockOutcome, ReleaseOutcome};

use super::Client;

/// Result of `lock_info`: whether the server currently holds an exclusive
/// lock, and how many shared locks are outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockInfo {
    pub exclusive: bool,
    pub num_shared: u32,
}

/// The six remote/local transitions `AsyncRemoteLocalControl` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteLocalRequest {
    DisableRemote = 0,
    EnableRemote = 1,
    DisableRemoteGoToLocal = 2,
    EnableRemoteGoToRemote = 3,
    EnableRemoteLockoutLocal = 4,
    EnableRemoteGoToRemoteLockoutLocal = 5,
    GoToLocal = 6,
}

impl Client {
    /// Bit 4 (MAV) of the status byte, alongside the full byte.
    pub async fn status_query(&mut self) -> Result<(bool, u8), ClientError> {
        let control = self.state.rmt_control_byte();
        let parameter = self.state.most_recent_message_id;
        self.asynch
            .send(&MessageType::AsyncStatusQuery.params(control, parameter))
            .await?;

        let msg = self.recv_on_async().await?;
        let status = msg.control_code;
        let mav = status & 0x10 != 0;
        Ok((mav, status))
    }

    /// Request a lock. An empty `lock_string` requests the exclusive lock;
    /// a non-empty one requests a shared lock identified by that string.
    pub async fn request_lock(&mut self, lock_string: &str) -> Result<LockOutcome, ClientError> {
        self.asynch
            .send(
                &MessageType::AsyncLock
                    .params(1, self.state.lock_timeout_ms)
                    .with_payload(lock_string.as_bytes().to_vec()),
            )
            .await?;

        let msg = self.recv_on_async().await?;
        match msg.control_code {
            1 => Ok(LockOutcome::Success),
            3 => Ok(LockOutcome::AlreadyExclusive),
            _ => Err(ClientError::Lock),
        }
    }

    /// Release a previously acquired lock. Uses message id 0 when the
    /// session has never written, matching the original client's
    /// behaviour (the standard is silent on this case).
    pub async fn release_lock(&mut self) -> Result<ReleaseOutcome, ClientError> {
        let parameter = self.state.release_message_id();
        self.asynch
            .send(&MessageType::AsyncLock.params(0, parameter))
            .await?;

        let msg = self.recv_on_async().await?;
        match msg.control_code {
            1 => Ok(ReleaseOutcome::SuccessExclusive),
            2 => Ok(ReleaseOutcome::SuccessShared),
            _ => Err(ClientError::Lock),
        }
    }

    pub async fn lock_info(&mut self) -> Result<LockInfo, ClientError> {
        self.asynch.send(&MessageType::AsyncLockInfo.params(0, 0)).await?;

        let msg = self.recv_on_async().await?;
        Ok(LockInfo {
            exclusive: msg.control_code != 0,
            num_shared: msg.message_parameter,
        })
    }

    /// Clear the device. Resets message ids and `rmt_delivered`, and
    /// records the server's `overlap_mode` choice, per spec §4.6/§4.3.
    pub async fn device_clear(&mut self) -> Result<(), ClientError> {
        self.asynch.send(&MessageType::AsyncDeviceClear.params(0, 0)).await?;
        let ack = self.recv_on_async().await?;
        let feature_preference = ack.control_code;

        self.sync
            .send(&MessageType::DeviceClearComplete.params(feature_preference, 0))
            .await?;
        let response = self.recv_on_sync().await?;

        self.state.overlap_mode = response.control_code != 0;
        self.state.reset_after_device_clear();
        Ok(())
    }

    /// Send a synchronous trigger. Advances the message-id counter like
    /// `write`, but carries no payload.
    pub async fn trigger(&mut self) -> Result<(), ClientError> {
        let control = self.state.rmt_control_byte();
        let id = self.state.next_message_id();
        self.sync.send(&MessageType::Trigger.params(control, id)).await
    }

    pub async fn remote_local(&mut self, request: RemoteLocalRequest) -> Result<(), ClientError> {
        let parameter = self.state.most_recent_message_id;
        self.asynch
            .send(&MessageType::AsyncRemoteLocalControl.params(request as u8, parameter))
            .await?;
        self.recv_on_async().await?;
        Ok(())
    }
}
