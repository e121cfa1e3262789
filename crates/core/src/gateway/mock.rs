use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{GatewayError, RecordGateway};
use crate::models::BorrowRecord;

/// Default artificial latency, matching the hosted sheet's typical round trip.
pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(800);

/// Gateway that performs no I/O: it waits, then reports a fixed outcome.
#[derive(Debug, Clone)]
pub struct MockGateway {
    delay: Duration,
    failure: Option<String>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_DELAY)
    }
}

impl MockGateway {
    /// Always-succeeding gateway with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
        }
    }

    /// Gateway that waits and then rejects every record with `reason`.
    pub fn failing(delay: Duration, reason: impl Into<String>) -> Self {
        Self {
            delay,
            failure: Some(reason.into()),
        }
    }
}

#[async_trait]
impl RecordGateway for MockGateway {
    async fn submit(&self, record: &BorrowRecord) -> Result<(), GatewayError> {
        debug!(record_id = %record.id, kind = %record.kind, "Mock gateway received record");
        tokio::time::sleep(self.delay).await;
        match &self.failure {
            Some(reason) => {
                warn!(record_id = %record.id, reason = %reason, "Mock gateway rejected record");
                Err(GatewayError::Rejected(reason.clone()))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn waits_the_configured_delay_then_succeeds() {
        let gateway = MockGateway::default();
        let started = Instant::now();
        gateway
            .submit(&BorrowRecord::return_all("12345"))
            .await
            .unwrap();
        assert!(started.elapsed() >= DEFAULT_MOCK_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_gateway_rejects() {
        let gateway = MockGateway::failing(Duration::from_millis(10), "sheet offline");
        let err = gateway
            .submit(&BorrowRecord::return_all("12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(reason) if reason == "sheet offline"));
    }
}
