//! Client-side navigation hook

use tracing::warn;

/// Performs the full-page redirect requested by the pipeline
pub trait Navigator: Send + Sync {
    fn redirect(&self, location: &str);
}

/// Records the redirect in the log; used where there is no page to move
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, location: &str) {
        warn!(location = %location, "Session expired, login required");
    }
}
