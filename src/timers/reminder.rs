//! Periodic reminders for urgent levels.
//!
//! While a level with a non-zero notification interval is active, a
//! background task emits a [`Notification::Reminder`] on every tick of that
//! interval. At most one reminder task exists at a time.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::data::{Level, SensorSnapshot};
use crate::notifier::{Notification, Notifier};

/// A running reminder task.
struct ReminderTask {
    /// Signals the task to quit.
    quit_tx: oneshot::Sender<()>,
    /// Joined on stop.
    handle: JoinHandle<()>,
}

/// Cancellable periodic reminder.
///
/// States are `idle` and `running(level)`. [`set`](Self::set) always stops a
/// running task before starting a new one, and [`stop`](Self::stop) returns
/// only after the task has exited.
pub struct ReminderScheduler {
    /// Notification sink.
    notifier: Arc<dyn Notifier>,
    /// Latest sensor snapshot, read on every tick.
    latest: watch::Receiver<Option<SensorSnapshot>>,
    /// Running task, if any. Held across the stop/start handshake.
    task: Mutex<Option<ReminderTask>>,
    /// Level of the running task.
    armed_level: RwLock<Option<Level>>,
}

impl ReminderScheduler {
    /// Create an idle scheduler.
    pub fn new(
        notifier: Arc<dyn Notifier>,
        latest: watch::Receiver<Option<SensorSnapshot>>,
    ) -> Self {
        info!("Reminder scheduler initialized");

        Self {
            notifier,
            latest,
            task: Mutex::new(None),
            armed_level: RwLock::new(None),
        }
    }

    /// Stop any running reminder and, if the level requests reminders,
    /// start a new one for it.
    ///
    /// Setting the same level again restarts its period.
    pub async fn set(&self, level: Level) {
        let mut slot = self.task.lock().await;
        self.stop_locked(&mut slot).await;

        if !level.has_reminder() {
            debug!("Level '{}' has no reminder interval", level.name);
            return;
        }

        info!(
            "Starting reminder for level '{}' every {:?}",
            level.name, level.notification_interval
        );

        let (quit_tx, quit_rx) = oneshot::channel();
        let handle = tokio::spawn(Self::run(
            level.clone(),
            self.notifier.clone(),
            self.latest.clone(),
            quit_rx,
        ));

        *self.armed_level.write() = Some(level);
        *slot = Some(ReminderTask { quit_tx, handle });
    }

    /// Stop the running reminder, waiting until its task has exited.
    ///
    /// No-op when idle.
    pub async fn stop(&self) {
        let mut slot = self.task.lock().await;
        self.stop_locked(&mut slot).await;
    }

    /// Check if a reminder task is running.
    pub fn is_running(&self) -> bool {
        self.armed_level.read().is_some()
    }

    /// Level of the running reminder.
    pub fn armed_level(&self) -> Option<Level> {
        self.armed_level.read().clone()
    }

    async fn stop_locked(&self, slot: &mut Option<ReminderTask>) {
        let Some(task) = slot.take() else {
            return;
        };

        info!("Stopping reminder");

        // The task may already be gone if it panicked
        let _ = task.quit_tx.send(());
        if let Err(e) = task.handle.await {
            warn!("Reminder task ended abnormally: {}", e);
        }

        *self.armed_level.write() = None;
        debug!("Reminder task exited");
    }

    async fn run(
        level: Level,
        notifier: Arc<dyn Notifier>,
        latest: watch::Receiver<Option<SensorSnapshot>>,
        mut quit_rx: oneshot::Receiver<()>,
    ) {
        let period = level.notification_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut quit_rx => break,
                _ = ticker.tick() => {
                    let value = latest.borrow().map(|s| s.value());
                    match value {
                        Some(value) => {
                            debug!("Reminder tick for level '{}' at {} %", level.name, value);
                            notifier.notify(Notification::Reminder {
                                level: level.clone(),
                                value,
                            });
                        }
                        None => debug!("Reminder tick without sensor data, skipping"),
                    }
                }
            }
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Direction, SensorReading};
    use crate::notifier::{ChannelNotifier, MockNotifier};
    use chrono::Utc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn snapshot(value: u8) -> Option<SensorSnapshot> {
        Some(SensorSnapshot {
            reading: SensorReading::new(value, Direction::Steady),
            last_updated: Utc::now(),
        })
    }

    fn low_level() -> Level {
        Level::new("low", 0, 30, Duration::from_secs(10))
    }

    fn scheduler() -> (
        ReminderScheduler,
        watch::Sender<Option<SensorSnapshot>>,
        UnboundedReceiver<Notification>,
    ) {
        let (notifier, rx) = ChannelNotifier::channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot(20));
        (
            ReminderScheduler::new(Arc::new(notifier), snapshot_rx),
            snapshot_tx,
            rx,
        )
    }

    fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_ticks_every_interval() {
        let (scheduler, _snapshot_tx, mut rx) = scheduler();

        scheduler.set(low_level()).await;
        assert!(scheduler.is_running());
        assert_eq!(scheduler.armed_level().map(|l| l.name), Some("low".to_string()));

        time::sleep(Duration::from_secs(35)).await;

        let notifications = drain(&mut rx);
        assert_eq!(notifications.len(), 3);
        assert!(notifications.iter().all(|n| matches!(
            n,
            Notification::Reminder { level, value: 20 } if level.name == "low"
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reminder_for_zero_interval() {
        let (scheduler, _snapshot_tx, mut rx) = scheduler();

        scheduler
            .set(Level::new("normal", 31, 66, Duration::ZERO))
            .await;
        assert!(!scheduler.is_running());

        time::sleep(Duration::from_secs(100)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_twice_restarts_period() {
        let (scheduler, _snapshot_tx, mut rx) = scheduler();

        scheduler.set(low_level()).await;
        time::sleep(Duration::from_secs(5)).await;
        scheduler.set(low_level()).await;

        // A surviving first task would tick at t=10
        time::sleep(Duration::from_secs(7)).await;
        assert!(drain(&mut rx).is_empty());

        // Restarted task ticks at t=15, then t=25
        time::sleep(Duration::from_secs(14)).await;
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_level() {
        let (scheduler, _snapshot_tx, mut rx) = scheduler();

        scheduler.set(low_level()).await;
        scheduler
            .set(Level::new("high", 67, 100, Duration::from_secs(4)))
            .await;

        time::sleep(Duration::from_secs(9)).await;
        let notifications = drain(&mut rx);
        assert_eq!(notifications.len(), 2);
        assert!(notifications
            .iter()
            .all(|n| matches!(n, Notification::Reminder { level, .. } if level.name == "high")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_ticks() {
        let (scheduler, _snapshot_tx, mut rx) = scheduler();

        scheduler.set(low_level()).await;
        time::sleep(Duration::from_secs(25)).await;
        assert_eq!(drain(&mut rx).len(), 2);

        scheduler.stop().await;
        assert!(!scheduler.is_running());
        assert!(scheduler.armed_level().is_none());

        time::sleep(Duration::from_secs(100)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle() {
        let (scheduler, _snapshot_tx, _rx) = scheduler();

        scheduler.stop().await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_reports_latest_value() {
        let (scheduler, snapshot_tx, mut rx) = scheduler();

        scheduler.set(low_level()).await;
        time::sleep(Duration::from_secs(11)).await;
        snapshot_tx.send_replace(snapshot(12));
        time::sleep(Duration::from_secs(10)).await;

        let values: Vec<u8> = drain(&mut rx)
            .into_iter()
            .filter_map(|n| match n {
                Notification::Reminder { value, .. } => Some(value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![20, 12]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_skips_without_sensor_data() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let (_snapshot_tx, snapshot_rx) = watch::channel(None);
        let scheduler = ReminderScheduler::new(Arc::new(notifier), snapshot_rx);

        scheduler.set(low_level()).await;
        time::sleep(Duration::from_secs(35)).await;
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reminder_with_mock_notifier() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| matches!(n, Notification::Reminder { value: 20, .. }))
            .times(2)
            .return_const(());

        let (_snapshot_tx, snapshot_rx) = watch::channel(snapshot(20));
        let scheduler = ReminderScheduler::new(Arc::new(notifier), snapshot_rx);

        scheduler.set(low_level()).await;
        time::sleep(Duration::from_secs(25)).await;
        scheduler.stop().await;
    }
}
