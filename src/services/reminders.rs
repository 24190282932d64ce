use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::identity::Clock;
use crate::models::reminder::{ReminderEvent, ReminderKind, ReminderSchedule, ScheduledReminderInfo};
use crate::models::user::UserId;
use crate::validation::ValidationError;

struct ActiveReminder {
    id: Uuid,
    task: JoinHandle<()>,
}

/// Keeps at most one pending reminder per (user, kind) and publishes each one
/// on a broadcast channel when it comes due. Delivery to devices happens
/// elsewhere; this only records the intent and fires on time.
#[derive(Clone)]
pub struct ReminderScheduler {
    clock: Arc<dyn Clock>,
    tx: broadcast::Sender<ReminderEvent>,
    active: Arc<Mutex<HashMap<(UserId, ReminderKind), ActiveReminder>>>,
}

impl ReminderScheduler {
    pub fn new(clock: Arc<dyn Clock>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            clock,
            tx,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReminderEvent> {
        self.tx.subscribe()
    }

    /// Schedule `schedule` for `user`, replacing any pending reminder of the
    /// same kind.
    pub async fn schedule(
        &self,
        user: UserId,
        schedule: ReminderSchedule,
    ) -> Result<ScheduledReminderInfo, ValidationError> {
        schedule.validate()?;
        let next_fire_at = schedule
            .next_fire_after(self.clock.now())
            .ok_or(ValidationError::InvalidTimeOfDay {
                hour: schedule.hour,
                minute: schedule.minute,
            })?;

        let id = Uuid::new_v4();
        let task = tokio::spawn(run_reminder(
            self.clock.clone(),
            self.tx.clone(),
            user.clone(),
            schedule.clone(),
        ));

        let key = (user.clone(), schedule.kind);
        let mut active = self.active.lock().await;
        if let Some(previous) = active.insert(key, ActiveReminder { id, task }) {
            previous.task.abort();
            tracing::debug!(user_id = %user, replaced = %previous.id, "Replaced pending reminder");
        }

        tracing::info!(
            user_id = %user,
            reminder_id = %id,
            kind = ?schedule.kind,
            next_fire_at = %next_fire_at,
            "Reminder scheduled"
        );

        Ok(ScheduledReminderInfo {
            id,
            schedule,
            next_fire_at,
        })
    }

    /// Returns whether a pending reminder was cancelled.
    pub async fn cancel(&self, user: &UserId, kind: ReminderKind) -> bool {
        let mut active = self.active.lock().await;
        match active.remove(&(user.clone(), kind)) {
            Some(reminder) => {
                let pending = !reminder.task.is_finished();
                reminder.task.abort();
                tracing::debug!(user_id = %user, reminder_id = %reminder.id, "Reminder cancelled");
                pending
            }
            None => false,
        }
    }

    /// Reminders still waiting to fire.
    #[cfg(test)]
    pub async fn pending_count(&self) -> usize {
        let active = self.active.lock().await;
        active.values().filter(|r| !r.task.is_finished()).count()
    }

    /// Abort every pending reminder. Used on shutdown.
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        let count = active.len();
        for (_, reminder) in active.drain() {
            reminder.task.abort();
        }
        tracing::info!(aborted = count, "Reminder scheduler stopped");
    }
}

async fn run_reminder(
    clock: Arc<dyn Clock>,
    tx: broadcast::Sender<ReminderEvent>,
    user: UserId,
    schedule: ReminderSchedule,
) {
    let mut after = clock.now();
    loop {
        let Some(next) = schedule.next_fire_after(after) else {
            break;
        };
        let wait = (next - clock.now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        // no subscribers is not an error; nobody is connected right now
        let _ = tx.send(ReminderEvent::new(user.clone(), schedule.kind, Utc::now()));
        tracing::debug!(user_id = %user, kind = ?schedule.kind, "Reminder fired");

        if !schedule.repeats {
            break;
        }
        // never fire the same slot twice if the wall clock lags the timer
        after = next.max(clock.now());
    }
}
