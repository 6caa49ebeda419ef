//! Narrow interface over the remote queue service.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::error::ClientError;

/// Opaque address of a queue, obtained from the remote service on creation or
/// lookup. Immutable once cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueEndpoint(String);

impl QueueEndpoint {
    /// Wrap a backend-provided endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The endpoint URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token identifying one delivery of a message, required to delete
/// that specific delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    /// Wrap a backend-provided receipt handle.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The receipt handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message returned by a receive call.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Raw message body.
    pub body: Vec<u8>,
    /// Token for deleting this delivery.
    pub receipt_handle: ReceiptHandle,
}

/// Parameters for a receive call.
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    /// Maximum messages returned per call. The poller always asks for one.
    pub max_messages: u32,
    /// Long-poll wait before an empty response is returned.
    pub wait: Duration,
    /// How long a received message stays hidden from other receivers before
    /// it becomes receivable again.
    pub visibility: Duration,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 1,
            wait: Duration::from_secs(20),
            visibility: Duration::from_secs(1),
        }
    }
}

/// Abstraction over the remote queue service.
///
/// The bridge delegates all queue semantics (visibility timeouts, redelivery,
/// ordering) to the backend behind this trait; it only manages local handoff
/// and worker lifecycle on top of these four operations.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Create the named queue if absent and return its endpoint.
    ///
    /// Must be idempotent: if the queue already exists, the existing endpoint
    /// is returned rather than an error.
    async fn create_queue(&self, name: &str) -> Result<QueueEndpoint, ClientError>;

    /// Send one payload to the queue at `endpoint`.
    async fn send(&self, endpoint: &QueueEndpoint, payload: &[u8]) -> Result<(), ClientError>;

    /// Receive up to `opts.max_messages` messages, waiting up to `opts.wait`
    /// before returning an empty batch.
    async fn receive(
        &self,
        endpoint: &QueueEndpoint,
        opts: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, ClientError>;

    /// Delete one delivery identified by its receipt handle.
    async fn delete(
        &self,
        endpoint: &QueueEndpoint,
        receipt: &ReceiptHandle,
    ) -> Result<(), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_options_defaults() {
        let opts = ReceiveOptions::default();
        assert_eq!(opts.max_messages, 1);
        assert_eq!(opts.wait, Duration::from_secs(20));
        assert_eq!(opts.visibility, Duration::from_secs(1));
    }

    #[test]
    fn test_endpoint_display_roundtrip() {
        let ep = QueueEndpoint::new("memory://orders");
        assert_eq!(ep.as_str(), "memory://orders");
        assert_eq!(format!("{ep}"), "memory://orders");
    }
}
