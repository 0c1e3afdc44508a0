use async_trait::async_trait;

/// Result of one delivery attempt. Failure is data, not an error: the caller
/// records it on the outreach row and reports it back to the reviewer.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub message: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryService: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> DeliveryOutcome;
}

/// Demo-mode transport: logs the outgoing email instead of sending it.
#[derive(Clone, Default)]
pub struct LoggedDelivery;

#[async_trait]
impl DeliveryService for LoggedDelivery {
    async fn send(&self, to: &str, subject: &str, body: &str) -> DeliveryOutcome {
        tracing::info!(to, subject, body_len = body.len(), "email sent (demo mode)");
        DeliveryOutcome {
            success: true,
            message: "Email logged (demo mode)".to_string(),
        }
    }
}
