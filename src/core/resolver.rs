//! Lazy, memoized queue-name to endpoint resolution.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::client::{QueueClient, QueueEndpoint};
use super::error::BridgeError;

/// Memoized mapping from queue name to queue endpoint.
///
/// The first resolution for a name issues one create-or-get call against the
/// remote service and caches the returned endpoint; later resolutions return
/// the cached endpoint without touching the network. Concurrent first calls
/// for the same name are serialized through a per-name gate so at most one
/// remote call is issued and every caller converges on the same endpoint.
///
/// Failed resolutions are never cached: the next call retries the remote
/// create-or-get.
pub struct EndpointResolver {
    client: Arc<dyn QueueClient>,
    cache: DashMap<String, QueueEndpoint>,
    /// Per-name gates serializing the first create-or-get call.
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl EndpointResolver {
    /// Create a resolver over the given client.
    #[must_use]
    pub fn new(client: Arc<dyn QueueClient>) -> Self {
        Self {
            client,
            cache: DashMap::new(),
            inflight: DashMap::new(),
        }
    }

    /// Resolve the endpoint for `name`, creating the queue if absent.
    ///
    /// # Errors
    ///
    /// Propagates the remote failure as [`BridgeError::Resolve`]; nothing is
    /// cached on failure.
    pub async fn resolve(&self, name: &str) -> Result<QueueEndpoint, BridgeError> {
        if let Some(endpoint) = self.cache.get(name) {
            return Ok(endpoint.value().clone());
        }

        let gate = self
            .inflight
            .entry(name.to_string())
            .or_default()
            .value()
            .clone();
        let _serialized = gate.lock().await;

        // A caller that held the gate may have filled the cache while we waited.
        if let Some(endpoint) = self.cache.get(name) {
            debug!(queue = %name, "endpoint resolved by concurrent caller");
            return Ok(endpoint.value().clone());
        }

        let endpoint = self
            .client
            .create_queue(name)
            .await
            .map_err(|source| BridgeError::Resolve {
                queue: name.to_string(),
                source,
            })?;

        info!(queue = %name, endpoint = %endpoint, "resolved queue endpoint");
        self.cache.insert(name.to_string(), endpoint.clone());
        Ok(endpoint)
    }

    /// Number of endpoints currently cached.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
