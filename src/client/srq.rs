//! Service-request waiting, see spec §4.6 and §5.
//!
//! A small latch coordinates the one mandatory background task (the SRQ
//! waiter) with foreground callers: `start_srq_wait` acquires it before
//! spawning, the task releases it once its callback has run (or the wait
//! was cancelled), and `join_srq` blocks by re-acquiring the same latch.

use std::sync::Arc;

use async_std::task::{self, JoinHandle};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::lock::Mutex;

use crate::common::message::MessageType;
use crate::error::ClientError;

use super::channel::Channel;
use super::Client;

pub(crate) struct Srq {
    latch: Arc<Mutex<()>>,
    events_tx: UnboundedSender<()>,
    events_rx: UnboundedReceiver<()>,
    task: Option<JoinHandle<()>>,
}

impl Srq {
    pub(crate) fn new() -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            latch: Arc::new(Mutex::new(())),
            events_tx,
            events_rx,
            task: None,
        }
    }

    /// Channel-based alternative to a callback, per spec's design notes:
    /// "implementations may also deliver SRQ events via a channel/queue".
    pub(crate) fn events(&mut self) -> &mut UnboundedReceiver<()> {
        &mut self.events_rx
    }

    pub(crate) async fn start<F>(&mut self, asynch: Arc<Channel>, callback: F) -> Result<(), ClientError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.task.is_some() {
            return Err(ClientError::Protocol(
                crate::common::errors::NonFatalErrorCode::UnidentifiedError,
                "an SRQ wait is already outstanding".to_string(),
            ));
        }

        let guard = self.latch.clone().lock_owned().await;
        let events_tx = self.events_tx.clone();

        let handle = task::spawn(async move {
            // Held for the lifetime of the task; dropped (releasing the
            // latch) whether the wait completes, errors, or the channel
            // is closed out from under it.
            let _guard = guard;

            if let Ok(Ok(msg)) = asynch.recv_forever().await {
                if msg.message_type == MessageType::AsyncServiceRequest {
                    callback();
                    let _ = events_tx.unbounded_send(());
                }
            }
        });
        self.task = Some(handle);
        Ok(())
    }

    /// Block until the outstanding wait (if any) has released the latch,
    /// i.e. an SRQ arrived and its callback ran, or the wait was cancelled.
    pub(crate) async fn join(&mut self) {
        let _ = self.latch.lock().await;
        if let Some(task) = self.task.take() {
            task.await;
        }
    }
}

impl Client {
    /// Spawn a background task that blocks indefinitely on the asynchronous
    /// channel for the next `AsyncServiceRequest` and runs `callback` when
    /// it arrives. See spec §4.6 and §5: at most one wait may be
    /// outstanding; a new caller must `join_srq` or let it complete first.
    pub async fn start_srq_wait<F>(&mut self, callback: F) -> Result<(), ClientError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.srq.start(self.asynch.clone(), callback).await
    }

    /// Block the caller until the outstanding SRQ wait completes (an SRQ
    /// arrived, or the wait was cancelled by closing the channel).
    pub async fn join_srq(&mut self) {
        self.srq.join().await
    }

    /// Receive side of the channel-based alternative to `start_srq_wait`'s
    /// callback: one event is pushed here per delivered `AsyncServiceRequest`.
    pub fn srq_events(&mut self) -> &mut UnboundedReceiver<()> {
        self.srq.events()
    }
}
