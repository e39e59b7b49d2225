use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Keeps consecutive requests at least `interval` apart, no matter how many tasks issue them.
#[derive(Debug)]
pub(crate) struct Throttle {
    interval: Duration,

    /// When the last request was let through.
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Suspend until another request may be issued, and claim that slot. Returns the claimed
    /// instant.
    pub async fn wait(&self) -> Instant {
        if self.interval.is_zero() {
            return Instant::now();
        }

        // Held while sleeping, so that waiting tasks are let through one by one.
        let mut last = self.last.lock().await;

        if let Some(last) = *last {
            let next = last + self.interval;
            if next > Instant::now() {
                log::trace!("Throttling for {:?}.", next - Instant::now());
                tokio::time::sleep_until(next).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}
