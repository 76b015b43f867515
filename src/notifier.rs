//! Outbound notification capability.
//!
//! The engine never renders messages itself. It emits [`Notification`]s
//! through a [`Notifier`]; the messaging layer decides how to present them.
//! [`ChannelNotifier`] funnels notifications from the reading loop and the
//! timer tasks into one ordered queue for a single transport consumer.

use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::data::{Direction, Level};

/// An effect emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The level changed, or the first reading was classified.
    LevelChanged {
        /// The new level.
        level: Level,
        /// Direction of the change.
        direction: Direction,
        /// Smoothed value that triggered the change.
        value: u8,
    },
    /// Periodic reminder while a level with a reminder interval is active.
    Reminder {
        /// The level being reminded of.
        level: Level,
        /// Latest smoothed value at the time of the reminder.
        value: u8,
    },
    /// No reading arrived within the watchdog timeout.
    SensorStale {
        /// The configured timeout that elapsed.
        timeout: Duration,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelChanged {
                level,
                direction,
                value,
            } => write!(f, "level {} ({}) at {} %", level.name, direction, value),
            Self::Reminder { level, value } => {
                write!(f, "reminder for level {} at {} %", level.name, value)
            }
            Self::SensorStale { timeout } => {
                write!(f, "no sensor data for {} s", timeout.as_secs())
            }
        }
    }
}

/// Sink for engine notifications.
///
/// Implementations must not block: they are called from the reading loop
/// and from timer tasks.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Deliver a notification.
    fn notify(&self, notification: Notification);
}

/// Notifier backed by an unbounded multi-producer, single-consumer queue.
///
/// Clones share the same queue. Notifications from one producer are
/// delivered in the order they were sent.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Wrap an existing sender.
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    /// Create a notifier and the receiving end of its queue.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Check if the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            warn!("Outbound queue closed, dropping notification: {}", e.0);
        }
    }
}
