//! Background long-polling workers that feed handoff channels.
//!
//! One poller thread exists per consumed queue name. Each thread owns a
//! single-threaded tokio runtime for the async client calls and blocks on the
//! rendezvous push between receive and delete, so the remote queue is the only
//! buffer when no consumer is listening.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, warn};

use crate::config::BridgeConfig;

use super::client::{QueueClient, QueueEndpoint, ReceiveOptions, ReceivedMessage};

/// Handle to one queue's background poller, owned by the hub's registry.
pub(crate) struct PollerHandle {
    /// Dropping this sender fires the stop arm of the poller's select while it
    /// is blocked handing off a payload.
    stop_tx: Option<Sender<()>>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Ask the poller to stop. It exits at the next iteration boundary, or
    /// immediately if it is blocked on a handoff.
    pub(crate) fn signal(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.stop_tx.take();
    }

    /// Take the thread handle for joining. `None` after the first call.
    pub(crate) fn take_thread(&mut self) -> Option<JoinHandle<()>> {
        self.thread.take()
    }
}

/// Spawn the poller thread for one queue name.
///
/// The endpoint is resolved by the caller before the poller starts, so the
/// loop never has to deal with resolution failures.
pub(crate) fn spawn_poller(
    queue: String,
    endpoint: QueueEndpoint,
    client: Arc<dyn QueueClient>,
    handoff_tx: Sender<Vec<u8>>,
    config: &BridgeConfig,
) -> PollerHandle {
    let opts = ReceiveOptions {
        max_messages: 1,
        wait: config.wait_time(),
        visibility: config.visibility_timeout(),
    };
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

    let thread = std::thread::Builder::new()
        .name(format!("sqs-bridge-poller-{queue}"))
        .spawn(move || poll_loop(&queue, &endpoint, client.as_ref(), &handoff_tx, &stop_rx, &flag, &opts))
        .expect("failed to spawn poller thread");

    PollerHandle {
        stop_tx: Some(stop_tx),
        shutdown,
        thread: Some(thread),
    }
}

/// The poll loop: receive, hand off, delete, repeat.
fn poll_loop(
    queue: &str,
    endpoint: &QueueEndpoint,
    client: &dyn QueueClient,
    handoff_tx: &Sender<Vec<u8>>,
    stop_rx: &Receiver<()>,
    shutdown: &AtomicBool,
    opts: &ReceiveOptions,
) {
    debug!(queue, "poller thread started");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(queue, error = %e, "failed to create poller runtime");
            return;
        }
    };

    loop {
        if shutdown.load(Ordering::Acquire) {
            break;
        }

        let batch = match rt.block_on(client.receive(endpoint, opts)) {
            Ok(batch) => batch,
            Err(e) => {
                // Treated as transient: retry immediately, the long-poll wait
                // already bounds the loop rate.
                warn!(queue, error = %e, "receive failed, retrying");
                continue;
            }
        };

        let Some(message) = batch.into_iter().next() else {
            continue;
        };
        let ReceivedMessage {
            body,
            receipt_handle,
        } = message;

        // Rendezvous handoff: blocks until a consumer takes the payload, so at
        // most one message is in flight locally and everything else waits on
        // the remote queue behind its visibility timeout.
        crossbeam_channel::select! {
            send(handoff_tx, body) -> handed_off => {
                if handed_off.is_err() {
                    debug!(queue, "handoff channel closed, poller exiting");
                    break;
                }
                // Delete strictly after a successful handoff. A crash between
                // receive and delete leaves the message to reappear once the
                // visibility timeout elapses.
                if let Err(e) = rt.block_on(client.delete(endpoint, &receipt_handle)) {
                    warn!(
                        queue,
                        receipt = %receipt_handle,
                        error = %e,
                        "delete failed; message may be redelivered"
                    );
                }
            }
            recv(stop_rx) -> _stop => {
                debug!(queue, "stop signal received while handing off");
                break;
            }
        }
    }

    debug!(queue, "poller thread exiting");
}
