//! AWS SQS client backend.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use tracing::info;

use crate::core::client::{
    QueueClient, QueueEndpoint, ReceiptHandle, ReceiveOptions, ReceivedMessage,
};
use crate::core::error::ClientError;

/// Remote backend over AWS SQS.
///
/// Credentials and region come from the SDK's default provider chain: explicit
/// environment variables first, then shared config files, then the host's
/// instance profile. The chain is resolved once at construction; the bridge
/// never re-resolves per call.
pub struct SqsQueueClient {
    client: Client,
}

impl SqsQueueClient {
    /// Resolve the default credential/region chain and build a client.
    pub async fn from_env() -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        info!(region = ?shared.region(), "resolved AWS configuration");
        Self {
            client: Client::new(&shared),
        }
    }

    /// Build over a preconfigured SDK client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn backend_err(e: impl std::fmt::Display) -> ClientError {
    ClientError::Backend(e.to_string())
}

/// SQS message bodies are text; a payload that is not valid UTF-8 cannot be
/// carried without corruption, so it is rejected rather than lossily encoded.
fn encode_body(payload: &[u8]) -> Result<String, ClientError> {
    String::from_utf8(payload.to_vec())
        .map_err(|e| ClientError::InvalidPayload(format!("message body must be valid UTF-8: {e}")))
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn create_queue(&self, name: &str) -> Result<QueueEndpoint, ClientError> {
        if name.is_empty() {
            return Err(ClientError::InvalidQueueName {
                name: name.to_string(),
                reason: "name must not be empty".into(),
            });
        }
        // CreateQueue is idempotent for an existing queue with unchanged
        // attributes: it returns the existing queue URL.
        let resp = self
            .client
            .create_queue()
            .queue_name(name)
            .send()
            .await
            .map_err(backend_err)?;
        let url = resp
            .queue_url()
            .ok_or_else(|| ClientError::Backend("create_queue returned no queue url".into()))?;
        Ok(QueueEndpoint::new(url))
    }

    async fn send(&self, endpoint: &QueueEndpoint, payload: &[u8]) -> Result<(), ClientError> {
        self.client
            .send_message()
            .queue_url(endpoint.as_str())
            .message_body(encode_body(payload)?)
            .send()
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn receive(
        &self,
        endpoint: &QueueEndpoint,
        opts: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, ClientError> {
        let resp = self
            .client
            .receive_message()
            .queue_url(endpoint.as_str())
            .max_number_of_messages(i32::try_from(opts.max_messages).unwrap_or(1))
            .wait_time_seconds(i32::try_from(opts.wait.as_secs()).unwrap_or(20))
            .visibility_timeout(i32::try_from(opts.visibility.as_secs()).unwrap_or(1))
            .send()
            .await
            .map_err(backend_err)?;

        let messages = resp
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                // A message without a receipt handle cannot be deleted; skip it
                // and let it redeliver.
                let receipt = m.receipt_handle?;
                Some(ReceivedMessage {
                    body: m.body.unwrap_or_default().into_bytes(),
                    receipt_handle: ReceiptHandle::new(receipt),
                })
            })
            .collect();
        Ok(messages)
    }

    async fn delete(
        &self,
        endpoint: &QueueEndpoint,
        receipt: &ReceiptHandle,
    ) -> Result<(), ClientError> {
        self.client
            .delete_message()
            .queue_url(endpoint.as_str())
            .receipt_handle(receipt.as_str())
            .send()
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_utf8_payload_is_rejected_not_mangled() {
        let err = encode_body(&[0x6f, 0xff, 0x6f]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidPayload(_)));
    }

    #[test]
    fn test_utf8_payload_passes_through_unchanged() {
        assert_eq!(encode_body(b"order-42").unwrap(), "order-42");
    }
}
