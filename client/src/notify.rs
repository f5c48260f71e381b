//! User-visible feedback.

use tracing::{error, info};

/// Fire-and-forget surface for user notifications. Implementations must not
/// block; callers never inspect an outcome.
pub trait NotificationSink: Send + Sync {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Routes notifications into the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn info(&self, message: &str) {
        info!(target: "vft::notify", "{message}");
    }

    fn success(&self, message: &str) {
        info!(target: "vft::notify", success = true, "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "vft::notify", "{message}");
    }
}
