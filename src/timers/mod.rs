//! Background timers.
//!
//! Both timers run as tokio tasks next to the reading loop. They only read
//! data captured when they were armed and only write through the
//! [`Notifier`](crate::notifier::Notifier).

pub mod reminder;
pub mod watchdog;

pub use reminder::ReminderScheduler;
pub use watchdog::StalenessWatchdog;
