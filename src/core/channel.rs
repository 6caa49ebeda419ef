//! Blocking rendezvous channel masking the remote queue transport.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Why a receive attempt returned without a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// No payload was available within the wait.
    Empty,
    /// The poller feeding this channel has stopped.
    Disconnected,
}

/// Consumer handle for one queue's handoff channel.
///
/// The underlying channel has capacity zero: the poller's push blocks until
/// exactly one consumer takes the payload, so at most one message is ever in
/// flight locally and a payload is never buffered, duplicated, or dropped.
///
/// Handles are cheap to clone and may be shared across threads; each payload
/// is delivered to exactly one receiver.
#[derive(Debug, Clone)]
pub struct HandoffChannel {
    rx: Receiver<Vec<u8>>,
}

impl HandoffChannel {
    /// Block the calling thread until the poller hands off the next payload.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError::Disconnected`] once the poller for this queue has
    /// shut down.
    pub fn recv(&self) -> Result<Vec<u8>, RecvError> {
        self.rx.recv().map_err(|_| RecvError::Disconnected)
    }

    /// Block up to `timeout` for the next payload.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError::Empty`] if nothing arrived within `timeout`, or
    /// [`RecvError::Disconnected`] if the poller has shut down.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Vec<u8>, RecvError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => RecvError::Empty,
            RecvTimeoutError::Disconnected => RecvError::Disconnected,
        })
    }

    /// Take a payload only if a poller is currently blocked handing one off.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError::Empty`] if no handoff is pending, or
    /// [`RecvError::Disconnected`] if the poller has shut down.
    pub fn try_recv(&self) -> Result<Vec<u8>, RecvError> {
        self.rx.try_recv().map_err(|e| match e {
            TryRecvError::Empty => RecvError::Empty,
            TryRecvError::Disconnected => RecvError::Disconnected,
        })
    }

    /// True if `other` consumes from the same underlying channel.
    #[must_use]
    pub fn same_channel(&self, other: &Self) -> bool {
        self.rx.same_channel(&other.rx)
    }
}

/// Create a capacity-zero rendezvous channel for one queue name.
///
/// The sender side belongs to the queue's poller; the receiver side is handed
/// to consumers through the registry.
pub(crate) fn rendezvous() -> (Sender<Vec<u8>>, HandoffChannel) {
    let (tx, rx) = bounded(0);
    (tx, HandoffChannel { rx })
}
