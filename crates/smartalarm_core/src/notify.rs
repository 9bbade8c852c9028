//! Local notification scheduling seam.
//!
//! Notifications are fire-and-forget reminders owned by the platform. They are
//! not coordinated with in-app ringing; the registry only keeps the returned
//! handle so a delete can cancel the pending notification.

use crate::model::alarm::AlarmRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Platform-reported notification failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyError(pub String);

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification error: {}", self.0)
    }
}

impl Error for NotifyError {}

pub trait Notifier: Send {
    /// Schedules a daily notification for `alarm` and returns its handle.
    fn schedule(&mut self, alarm: &AlarmRecord) -> Result<String, NotifyError>;
    /// Cancels a previously scheduled notification.
    fn cancel(&mut self, handle: &str) -> Result<(), NotifyError>;
}

/// Notifier for hosts without local notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn schedule(&mut self, alarm: &AlarmRecord) -> Result<String, NotifyError> {
        Ok(format!("noop-{}", alarm.id))
    }

    fn cancel(&mut self, _handle: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
