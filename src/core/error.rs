//! Error types for bridge operations.

use thiserror::Error;

/// Errors produced by remote queue client backends.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The named queue does not exist on the backend.
    #[error("queue not found: {0}")]
    QueueNotFound(String),
    /// The backend rejected the queue name.
    #[error("invalid queue name `{name}`: {reason}")]
    InvalidQueueName {
        /// The offending queue name.
        name: String,
        /// Why the backend rejected it.
        reason: String,
    },
    /// The backend cannot carry the payload as given.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// Transport or backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors surfaced to callers of the hub's foreground operations.
///
/// Background receive and delete failures never appear here; the poller logs
/// them and keeps going. Foreground calls return the error and let the caller
/// decide.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Endpoint resolution (create-or-get) failed for a queue.
    #[error("endpoint resolution failed for `{queue}`: {source}")]
    Resolve {
        /// The queue name being resolved.
        queue: String,
        /// The underlying client failure.
        source: ClientError,
    },
    /// A send to the remote queue failed.
    #[error("send failed for `{queue}`: {source}")]
    Send {
        /// The destination queue name.
        queue: String,
        /// The underlying client failure.
        source: ClientError,
    },
    /// The hub has been shut down; no further subscriptions or sends.
    #[error("queue hub is shut down")]
    Shutdown,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
