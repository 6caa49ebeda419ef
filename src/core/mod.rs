//! Core bridging abstractions and the queue hub.

pub mod channel;
pub mod client;
pub mod error;
pub mod hub;
mod poller;
pub mod resolver;

pub use channel::{HandoffChannel, RecvError};
pub use client::{QueueClient, QueueEndpoint, ReceiptHandle, ReceiveOptions, ReceivedMessage};
pub use error::{AppResult, BridgeError, ClientError};
pub use hub::QueueHub;
pub use resolver::EndpointResolver;
