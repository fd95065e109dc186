use chrono::{DateTime, Utc};

use crate::api::Reminder;

/// Reminder with its completion set to `completed`. `completed_at` is stamped
/// with `now` when completing and cleared when reopening.
pub fn apply(reminder: &Reminder, completed: bool, now: DateTime<Utc>) -> Reminder {
    let mut next = reminder.clone();
    next.is_completed = completed;
    next.completed_at = completed.then_some(now);
    next
}

/// Completion fields captured before an optimistic change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionState {
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CompletionState {
    pub fn of(reminder: &Reminder) -> Self {
        Self {
            is_completed: reminder.is_completed,
            completed_at: reminder.completed_at,
        }
    }

    pub fn restore(&self, reminder: &mut Reminder) {
        reminder.is_completed = self.is_completed;
        reminder.completed_at = self.completed_at;
    }
}
