//! EC2 instance metadata lookups.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// IMDS path for the host's instance id.
const INSTANCE_ID_URL: &str = "http://169.254.169.254/latest/meta-data/instance-id";

/// Errors from instance metadata lookups.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The metadata service could not be reached, timed out, or answered with
    /// a non-success status.
    #[error("metadata request failed: {0}")]
    Request(String),
}

/// Fetch the EC2 instance id for the host machine.
///
/// `timeout` bounds the whole request, so off-EC2 hosts fail fast instead of
/// hanging; callers decide how to fall back.
///
/// # Errors
///
/// Returns [`MetadataError::Request`] on any transport or status failure.
pub async fn instance_id(timeout: Duration) -> Result<String, MetadataError> {
    fetch(INSTANCE_ID_URL, timeout).await
}

async fn fetch(url: &str, timeout: Duration) -> Result<String, MetadataError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MetadataError::Request(e.to_string()))?;
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| MetadataError::Request(e.to_string()))?
        .error_for_status()
        .map_err(|e| MetadataError::Request(e.to_string()))?;
    let body = resp
        .text()
        .await
        .map_err(|e| MetadataError::Request(e.to_string()))?;
    debug!(url, bytes = body.len(), "metadata lookup succeeded");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_error_display() {
        let err = MetadataError::Request("connection timed out".into());
        assert!(format!("{err}").contains("connection timed out"));
    }
}
