//! Sensor staleness watchdog.
//!
//! A one-shot deadline timer that is re-armed on every reading. If the
//! deadline elapses without a reset, a [`Notification::SensorStale`] is
//! emitted once and the watchdog stays disarmed until the next reset.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notifier::{Notification, Notifier};

/// Re-armable deadline timer for incoming readings.
pub struct StalenessWatchdog {
    /// Time without readings before the sensor counts as stale.
    timeout: Duration,
    /// Notification sink.
    notifier: Arc<dyn Notifier>,
    /// Deadline task. Finished tasks are left in place until the next reset.
    timer: Mutex<Option<JoinHandle<()>>>,
    /// Whether a deadline is pending.
    armed: Arc<AtomicBool>,
}

impl StalenessWatchdog {
    /// Create a disarmed watchdog.
    pub fn new(timeout: Duration, notifier: Arc<dyn Notifier>) -> Self {
        info!("Watchdog initialized with timeout {:?}", timeout);

        Self {
            timeout,
            notifier,
            timer: Mutex::new(None),
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Arm the deadline, cancelling any pending one first.
    ///
    /// The previous deadline task is joined before the new one is spawned,
    /// so two deadlines never overlap.
    pub async fn reset(&self) {
        let mut slot = self.timer.lock().await;

        if Self::cancel(&mut slot).await {
            debug!("Watchdog restarted");
        } else {
            debug!("Watchdog armed");
        }

        self.armed.store(true, Ordering::SeqCst);

        let timeout = self.timeout;
        let armed = self.armed.clone();
        let notifier = self.notifier.clone();

        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            armed.store(false, Ordering::SeqCst);
            warn!("No sensor data received for {:?}", timeout);
            notifier.notify(Notification::SensorStale { timeout });
        }));
    }

    /// Cancel the pending deadline, if any, and wait for its task to end.
    pub async fn disarm(&self) {
        let mut slot = self.timer.lock().await;
        if Self::cancel(&mut slot).await {
            info!("Watchdog disarmed");
        }
        self.armed.store(false, Ordering::SeqCst);
    }

    /// Check if a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether a deadline was still pending.
    async fn cancel(slot: &mut Option<JoinHandle<()>>) -> bool {
        let Some(handle) = slot.take() else {
            return false;
        };

        let pending = !handle.is_finished();
        handle.abort();
        // A deadline that already elapsed has run to completion
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                warn!("Watchdog task ended abnormally: {}", e);
            }
        }
        pending
    }
}

impl Drop for StalenessWatchdog {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{ChannelNotifier, MockNotifier};
    use tokio::time;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_timeout() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        let watchdog = StalenessWatchdog::new(TIMEOUT, Arc::new(notifier));
        assert!(!watchdog.is_armed());

        watchdog.reset().await;
        assert!(watchdog.is_armed());

        time::sleep(Duration::from_secs(11)).await;
        assert_eq!(
            rx.try_recv().ok(),
            Some(Notification::SensorStale { timeout: TIMEOUT })
        );
        assert!(!watchdog.is_armed());

        time::sleep(Duration::from_secs(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frequent_resets_never_fire() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();
        let watchdog = StalenessWatchdog::new(TIMEOUT, Arc::new(notifier));

        for _ in 0..20 {
            watchdog.reset().await;
            time::sleep(Duration::from_secs(9)).await;
        }
        assert!(watchdog.is_armed());

        watchdog.disarm().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearms_after_firing() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| *n == Notification::SensorStale { timeout: TIMEOUT })
            .times(2)
            .return_const(());
        let watchdog = StalenessWatchdog::new(TIMEOUT, Arc::new(notifier));

        watchdog.reset().await;
        time::sleep(Duration::from_secs(15)).await;
        assert!(!watchdog.is_armed());

        watchdog.reset().await;
        assert!(watchdog.is_armed());
        time::sleep(Duration::from_secs(15)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_cancels_deadline() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        let watchdog = StalenessWatchdog::new(TIMEOUT, Arc::new(notifier));

        watchdog.reset().await;
        time::sleep(Duration::from_secs(5)).await;
        watchdog.disarm().await;
        assert!(!watchdog.is_armed());

        time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());

        // Disarming twice is harmless
        watchdog.disarm().await;
    }
}
