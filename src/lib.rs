//! # SQS Bridge
//!
//! A thin convenience layer that exposes remote SQS-style queues as in-process
//! blocking channels, backed by background long-polling workers.
//!
//! ## Core Mechanism
//!
//! A [`core::QueueHub`] owns a remote queue client, an endpoint cache, and a
//! channel registry. The first subscription to a queue name lazily resolves the
//! queue's endpoint (creating the queue if absent), registers a capacity-zero
//! rendezvous channel, and starts exactly one poller thread bound to that name.
//! The poller long-polls the remote queue, hands each payload to a consumer
//! through the rendezvous channel, and deletes the message only after the
//! handoff succeeds. While no consumer is listening, at most one message is
//! held in flight locally; everything else stays on the remote queue behind
//! its visibility timeout.
//!
//! ## Key Properties
//!
//! - **One channel, one poller per queue name**: concurrent first-time
//!   subscribers converge on a single channel and a single poller.
//! - **Total backpressure**: the rendezvous push blocks the poller until a
//!   consumer is ready, so the remote queue is the only buffer.
//! - **Delete after delivery**: a message is deleted remotely only once a
//!   consumer has taken it; crashes in between leave the message to reappear
//!   after the visibility timeout.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sqs_bridge::config::BridgeConfig;
//! use sqs_bridge::core::QueueHub;
//! use sqs_bridge::infra::SqsQueueClient;
//!
//! # async fn example() -> sqs_bridge::core::AppResult<()> {
//! let client = Arc::new(SqsQueueClient::from_env().await);
//! let hub = QueueHub::new(client, BridgeConfig::default());
//!
//! // Publish.
//! hub.send("orders", b"order-42").await?;
//!
//! // Subscribe: blocks the calling thread until the poller hands off a payload.
//! let orders = hub.channel_for("orders").await?;
//! if let Ok(payload) = orders.recv() {
//!     println!("got {} bytes", payload.len());
//! }
//!
//! hub.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! For development and testing without a remote service, use
//! [`infra::InMemoryQueueClient`], a local backend honoring the same contract
//! (create-or-get, long-poll waits, visibility timeouts, receipt handles).

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

/// Core bridging mechanism: client interface, resolver, channels, hub, pollers.
pub mod core;
/// Configuration models for polling and shutdown behavior.
pub mod config;
/// Infrastructure adapters: concrete remote queue client backends.
pub mod infra;
/// EC2 instance metadata lookups.
#[cfg(feature = "aws")]
pub mod metadata;
/// Shared utilities.
pub mod util;
