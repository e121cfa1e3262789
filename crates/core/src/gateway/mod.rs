//! Record sink boundary.
//!
//! Every borrow/return record is handed to a [`RecordGateway`]. Delivery is
//! best effort: a successful return means the sink accepted the request, not
//! that the row was durably written. Nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::{
    config::{GatewayConfig, GatewayKind},
    models::BorrowRecord,
};

/// Artificial-delay sink used until a real endpoint is configured.
pub mod mock;
/// HTTP webhook sink.
pub mod webhook;

pub use mock::MockGateway;
pub use webhook::WebhookGateway;

/// Errors reported by a gateway submission.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP request failed (network, DNS, timeout, bad URL).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The endpoint answered with a non-2xx status.
    #[error("sink returned HTTP {0}")]
    HttpStatus(u16),
    /// The sink refused the record without a transport error.
    #[error("sink rejected the record: {0}")]
    Rejected(String),
}

/// Destination for submitted records.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Forward one record to the sink.
    async fn submit(&self, record: &BorrowRecord) -> Result<(), GatewayError>;
}

/// Shared gateway handle passed to spawned submission tasks.
pub type SharedGateway = Arc<dyn RecordGateway>;

/// Build the gateway selected in configuration.
pub fn from_config(config: &GatewayConfig) -> anyhow::Result<SharedGateway> {
    match config.kind {
        GatewayKind::Mock => {
            info!(delay_ms = config.mock_delay_ms, "Using mock record gateway");
            Ok(Arc::new(MockGateway::new(config.mock_delay())))
        }
        GatewayKind::Webhook => {
            info!(url = %config.webhook_url, "Using webhook record gateway");
            Ok(Arc::new(WebhookGateway::new(
                config.webhook_url.clone(),
                config.timeout(),
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_readable() {
        assert_eq!(
            GatewayError::HttpStatus(502).to_string(),
            "sink returned HTTP 502"
        );
        assert_eq!(
            GatewayError::Rejected("offline".into()).to_string(),
            "sink rejected the record: offline"
        );
    }

    #[test]
    fn builds_each_kind() -> anyhow::Result<()> {
        let mut config = GatewayConfig::default();
        from_config(&config)?;
        config.kind = GatewayKind::Webhook;
        from_config(&config)?;
        Ok(())
    }
}
