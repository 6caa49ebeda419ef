//! In-memory queue backend for development and testing.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;
use uuid::Uuid;

use crate::core::client::{
    QueueClient, QueueEndpoint, ReceiptHandle, ReceiveOptions, ReceivedMessage,
};
use crate::core::error::ClientError;

const ENDPOINT_SCHEME: &str = "memory://";

/// Upper bound on one long-poll sleep slice so arrivals and visibility
/// expirations are observed promptly.
const POLL_SLICE: Duration = Duration::from_millis(25);

struct StoredMessage {
    body: Vec<u8>,
    /// Receipt handle of the most recent delivery, regenerated per receive.
    receipt_handle: Option<String>,
    /// When the message becomes receivable (again).
    visible_at: Instant,
}

#[derive(Default)]
struct QueueState {
    messages: Vec<StoredMessage>,
}

/// Local queue backend mirroring the remote service contract: create-or-get,
/// long-poll waits, visibility timeouts, per-receive receipt handles, and
/// delete-by-receipt.
///
/// Messages received but not deleted become receivable again once their
/// visibility timeout elapses, with a fresh receipt handle.
#[derive(Default)]
pub struct InMemoryQueueClient {
    queues: Mutex<HashMap<String, QueueState>>,
    /// Woken on every send so long-poll receivers re-check promptly.
    arrivals: Notify,
}

impl InMemoryQueueClient {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages currently stored for `name`, visible or in flight.
    #[must_use]
    pub fn depth(&self, name: &str) -> usize {
        self.queues
            .lock()
            .get(name)
            .map_or(0, |q| q.messages.len())
    }

    fn queue_name(endpoint: &QueueEndpoint) -> Result<String, ClientError> {
        endpoint
            .as_str()
            .strip_prefix(ENDPOINT_SCHEME)
            .map(ToString::to_string)
            .ok_or_else(|| ClientError::QueueNotFound(endpoint.as_str().to_string()))
    }

    /// Receive up to `max` visible messages, hiding each behind `visibility`.
    fn take_visible(
        &self,
        name: &str,
        max: usize,
        visibility: Duration,
    ) -> Result<Vec<ReceivedMessage>, ClientError> {
        let now = Instant::now();
        let mut queues = self.queues.lock();
        let queue = queues
            .get_mut(name)
            .ok_or_else(|| ClientError::QueueNotFound(name.to_string()))?;

        let mut taken = Vec::new();
        for message in &mut queue.messages {
            if taken.len() >= max {
                break;
            }
            if message.visible_at > now {
                continue;
            }
            let receipt = Uuid::new_v4().to_string();
            message.receipt_handle = Some(receipt.clone());
            message.visible_at = now + visibility;
            taken.push(ReceivedMessage {
                body: message.body.clone(),
                receipt_handle: ReceiptHandle::new(receipt),
            });
        }
        Ok(taken)
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn create_queue(&self, name: &str) -> Result<QueueEndpoint, ClientError> {
        if name.is_empty() {
            return Err(ClientError::InvalidQueueName {
                name: name.to_string(),
                reason: "name must not be empty".into(),
            });
        }
        let mut queues = self.queues.lock();
        if !queues.contains_key(name) {
            debug!(queue = %name, "creating in-memory queue");
            queues.insert(name.to_string(), QueueState::default());
        }
        Ok(QueueEndpoint::new(format!("{ENDPOINT_SCHEME}{name}")))
    }

    async fn send(&self, endpoint: &QueueEndpoint, payload: &[u8]) -> Result<(), ClientError> {
        let name = Self::queue_name(endpoint)?;
        {
            let mut queues = self.queues.lock();
            let queue = queues
                .get_mut(&name)
                .ok_or_else(|| ClientError::QueueNotFound(name.clone()))?;
            queue.messages.push(StoredMessage {
                body: payload.to_vec(),
                receipt_handle: None,
                visible_at: Instant::now(),
            });
        }
        debug!(queue = %name, bytes = payload.len(), "queued message");
        self.arrivals.notify_waiters();
        Ok(())
    }

    async fn receive(
        &self,
        endpoint: &QueueEndpoint,
        opts: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, ClientError> {
        let name = Self::queue_name(endpoint)?;
        let max = opts.max_messages.max(1) as usize;
        let deadline = Instant::now() + opts.wait;

        loop {
            let taken = self.take_visible(&name, max, opts.visibility)?;
            if !taken.is_empty() {
                return Ok(taken);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Vec::new());
            }
            // Sleep in short slices; an arrival notification cuts the slice
            // short, a visibility expiry is caught by the next re-check.
            let wake = self.arrivals.notified();
            let _ = tokio::time::timeout(remaining.min(POLL_SLICE), wake).await;
        }
    }

    async fn delete(
        &self,
        endpoint: &QueueEndpoint,
        receipt: &ReceiptHandle,
    ) -> Result<(), ClientError> {
        let name = Self::queue_name(endpoint)?;
        let mut queues = self.queues.lock();
        let queue = queues
            .get_mut(&name)
            .ok_or_else(|| ClientError::QueueNotFound(name.clone()))?;
        let before = queue.messages.len();
        queue
            .messages
            .retain(|m| m.receipt_handle.as_deref() != Some(receipt.as_str()));
        if queue.messages.len() == before {
            debug!(queue = %name, receipt = %receipt, "delete matched no delivery");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(wait_ms: u64, visibility_ms: u64) -> ReceiveOptions {
        ReceiveOptions {
            max_messages: 1,
            wait: Duration::from_millis(wait_ms),
            visibility: Duration::from_millis(visibility_ms),
        }
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let client = InMemoryQueueClient::new();
        let first = client.create_queue("orders").await.unwrap();
        let second = client.create_queue("orders").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_str(), "memory://orders");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let client = InMemoryQueueClient::new();
        let err = client.create_queue("").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidQueueName { .. }));
    }

    #[tokio::test]
    async fn test_send_receive_delete_flow() {
        let client = InMemoryQueueClient::new();
        let endpoint = client.create_queue("orders").await.unwrap();
        client.send(&endpoint, b"order-42").await.unwrap();
        assert_eq!(client.depth("orders"), 1);

        let batch = client.receive(&endpoint, &opts(100, 5000)).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, b"order-42");

        client
            .delete(&endpoint, &batch[0].receipt_handle)
            .await
            .unwrap();
        assert_eq!(client.depth("orders"), 0);
    }

    #[tokio::test]
    async fn test_undeleted_message_reappears_after_visibility_timeout() {
        let client = InMemoryQueueClient::new();
        let endpoint = client.create_queue("orders").await.unwrap();
        client.send(&endpoint, b"order-42").await.unwrap();

        let first = client.receive(&endpoint, &opts(100, 50)).await.unwrap();
        assert_eq!(first.len(), 1);

        // Hidden while the visibility timeout is in force.
        let hidden = client.receive(&endpoint, &opts(10, 50)).await.unwrap();
        assert!(hidden.is_empty());

        // Receivable again afterwards, with a fresh receipt handle.
        let second = client.receive(&endpoint, &opts(500, 50)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].body, b"order-42");
        assert_ne!(second[0].receipt_handle, first[0].receipt_handle);
    }

    #[tokio::test]
    async fn test_empty_receive_waits_out_the_long_poll() {
        let client = InMemoryQueueClient::new();
        let endpoint = client.create_queue("orders").await.unwrap();

        let started = Instant::now();
        let batch = client.receive(&endpoint, &opts(80, 1000)).await.unwrap();
        assert!(batch.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_receive_unknown_queue_fails() {
        let client = InMemoryQueueClient::new();
        let endpoint = QueueEndpoint::new("memory://nowhere");
        let err = client.receive(&endpoint, &opts(10, 50)).await.unwrap_err();
        assert!(matches!(err, ClientError::QueueNotFound(_)));
    }

    #[tokio::test]
    async fn test_send_wakes_a_waiting_receiver() {
        let client = std::sync::Arc::new(InMemoryQueueClient::new());
        let endpoint = client.create_queue("orders").await.unwrap();

        let receiver = {
            let client = std::sync::Arc::clone(&client);
            let endpoint = endpoint.clone();
            tokio::spawn(async move { client.receive(&endpoint, &opts(2000, 1000)).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        client.send(&endpoint, b"late-arrival").await.unwrap();

        let batch = receiver.await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, b"late-arrival");
    }
}
