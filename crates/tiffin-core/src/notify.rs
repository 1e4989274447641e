//! Notification seam
//!
//! State changes emit notification events through this trait. Delivery
//! of a notification is best-effort: callers log failures and carry on,
//! the primary state change has already committed.

use async_trait::async_trait;
use thiserror::Error;

use tiffin_types::Notification;

/// Notification delivery failure
#[derive(Error, Debug)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Emit a notification event
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Notifier that writes events to the log
///
/// Stands in for the real push/mail pipeline, which consumes the same
/// events downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %notification.recipient,
            kind = %notification.kind,
            title = %notification.title,
            "Notification emitted"
        );
        Ok(())
    }
}
