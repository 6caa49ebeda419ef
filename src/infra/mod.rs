//! Remote queue client backends.

pub mod memory;
#[cfg(feature = "aws")]
pub mod sqs;

pub use memory::InMemoryQueueClient;
#[cfg(feature = "aws")]
pub use sqs::SqsQueueClient;
