use std::time::Duration;

/// Spaces out outbound requests by a fixed delay. The first request goes
/// out immediately.
#[derive(Debug, Clone)]
pub(crate) struct Pacer {
    delay: Duration,
    sent: u64,
}

impl Pacer {
    pub(crate) fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            sent: 0,
        }
    }

    pub(crate) async fn wait(&mut self) {
        if self.sent > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sent += 1;
    }

    pub(crate) fn requests_sent(&self) -> u64 {
        self.sent
    }
}
