//! The queue hub: channel registry, producer path, and poller lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;

use super::channel::{rendezvous, HandoffChannel};
use super::client::QueueClient;
use super::error::BridgeError;
use super::poller::{spawn_poller, PollerHandle};
use super::resolver::EndpointResolver;

/// Registry entry pairing a queue's handoff channel with its poller.
struct ChannelEntry {
    channel: HandoffChannel,
    poller: PollerHandle,
}

/// Explicit context owning the remote client, the endpoint cache, and the
/// channel registry.
///
/// Hubs are self-contained: multiple independent instances may coexist, e.g.
/// one per test over a fake client. For a given hub and queue name, at most
/// one handoff channel and at most one poller exist for the hub's lifetime;
/// registration and poller start happen as a single atomic step under the
/// registry's write lock with a double-check after acquisition.
pub struct QueueHub {
    client: Arc<dyn QueueClient>,
    config: BridgeConfig,
    resolver: EndpointResolver,
    channels: RwLock<HashMap<String, ChannelEntry>>,
    shut_down: AtomicBool,
}

impl QueueHub {
    /// Create a hub over `client` with the given configuration.
    #[must_use]
    pub fn new(client: Arc<dyn QueueClient>, config: BridgeConfig) -> Self {
        Self {
            resolver: EndpointResolver::new(Arc::clone(&client)),
            client,
            config,
            channels: RwLock::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Subscribe to the named queue.
    ///
    /// Returns the existing handoff channel if one is registered for `name`.
    /// Otherwise resolves the queue endpoint (creating the queue if absent),
    /// registers a new rendezvous channel, and starts exactly one poller bound
    /// to `name` before any caller can observe the channel.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Resolve`] if the endpoint lookup/creation fails
    /// (nothing is registered in that case, and a later call retries), or
    /// [`BridgeError::Shutdown`] after [`QueueHub::shutdown`].
    pub async fn channel_for(&self, name: &str) -> Result<HandoffChannel, BridgeError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(BridgeError::Shutdown);
        }

        // Fast path under the read lock.
        {
            let channels = self.channels.read();
            if let Some(entry) = channels.get(name) {
                return Ok(entry.channel.clone());
            }
        }

        // Resolve before taking the write lock: resolution failures propagate
        // to this caller, and the poller is handed an endpoint it can trust.
        // The resolver single-flights concurrent first calls per name.
        let endpoint = self.resolver.resolve(name).await?;

        let mut channels = self.channels.write();
        // Re-check under the write lock: a shutdown that ran while we awaited
        // resolution has already drained and signaled the registry, so an
        // entry inserted now would never be signaled or joined.
        if self.shut_down.load(Ordering::Acquire) {
            return Err(BridgeError::Shutdown);
        }
        // Double-check: a concurrent caller may have registered while we
        // resolved.
        if let Some(entry) = channels.get(name) {
            return Ok(entry.channel.clone());
        }

        let (handoff_tx, channel) = rendezvous();
        let poller = spawn_poller(
            name.to_string(),
            endpoint,
            Arc::clone(&self.client),
            handoff_tx,
            &self.config,
        );
        info!(queue = %name, "registered handoff channel and started poller");
        channels.insert(
            name.to_string(),
            ChannelEntry {
                channel: channel.clone(),
                poller,
            },
        );
        Ok(channel)
    }

    /// Publish `payload` to the named queue.
    ///
    /// Resolves the endpoint first (implicitly creating the queue if absent),
    /// then issues exactly one send. Stateless beyond the endpoint cache.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Resolve`] if resolution fails,
    /// [`BridgeError::Send`] with the uninterpreted remote error if the send
    /// fails, or [`BridgeError::Shutdown`] after [`QueueHub::shutdown`].
    pub async fn send(&self, name: &str, payload: &[u8]) -> Result<(), BridgeError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(BridgeError::Shutdown);
        }
        let endpoint = self.resolver.resolve(name).await?;
        // Resolution may have spanned a shutdown.
        if self.shut_down.load(Ordering::Acquire) {
            return Err(BridgeError::Shutdown);
        }
        self.client
            .send(&endpoint, payload)
            .await
            .map_err(|source| BridgeError::Send {
                queue: name.to_string(),
                source,
            })
    }

    /// The endpoint resolver backing this hub.
    #[must_use]
    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Number of live pollers: one per queue name consumed so far.
    #[must_use]
    pub fn active_pollers(&self) -> usize {
        self.channels.read().len()
    }

    /// Shut down the hub: signal every poller and join their threads with a
    /// bounded wait per thread. Idempotent.
    ///
    /// Pollers blocked in a long-poll receive cannot be interrupted mid-call;
    /// any thread that does not exit within the configured join timeout is
    /// detached and exits on its own once the receive returns.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("shutting down queue hub");

        let mut pollers: Vec<(String, PollerHandle)> = {
            let mut channels = self.channels.write();
            channels
                .drain()
                .map(|(name, entry)| (name, entry.poller))
                .collect()
        };

        // Signal everyone first so the threads wind down concurrently.
        for (_, handle) in &mut pollers {
            handle.signal();
        }

        let join_timeout = self.config.join_timeout();
        for (name, mut handle) in pollers {
            let Some(thread) = handle.take_thread() else {
                continue;
            };
            let (done_tx, done_rx) = std::sync::mpsc::channel();
            let join_thread = std::thread::spawn(move || {
                let _ = done_tx.send(thread.join().is_ok());
            });
            match done_rx.recv_timeout(join_timeout) {
                Ok(true) => {
                    debug!(queue = %name, "poller joined");
                    let _ = join_thread.join();
                }
                Ok(false) => {
                    warn!(queue = %name, "poller panicked");
                    let _ = join_thread.join();
                }
                Err(_) => {
                    warn!(queue = %name, "poller did not exit within timeout, detaching");
                }
            }
        }

        info!("queue hub shut down");
    }
}

impl Drop for QueueHub {
    fn drop(&mut self) {
        // Signal but do not join; explicit shutdown() is required for a
        // graceful exit.
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            let mut channels = self.channels.write();
            for entry in channels.values_mut() {
                entry.poller.signal();
            }
            debug!("queue hub dropped without explicit shutdown, pollers detached");
        }
    }
}
