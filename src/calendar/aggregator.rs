use chrono::Utc;
use log::{error, warn};
use thiserror::Error;

use super::month::Month;
use super::session::{MonthPlan, PageRequest, ReminderSession, ToggleTicket};
use crate::api::{Page, Reminder, ReminderSource, Scope};
use crate::error::{FetchError, RequestError, ToggleError};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error(transparent)]
    Rejected(#[from] ToggleError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Perform the network half of a reserved page fetch.
pub async fn fetch(source: &dyn ReminderSource, req: &PageRequest) -> Result<Page, FetchError> {
    source.fetch_page(&req.scope, req.page, req.limit).await
}

/// Perform the network half of an optimistic toggle.
pub async fn send_toggle(source: &dyn ReminderSource, ticket: &ToggleTicket) -> Result<(), RequestError> {
    source.set_completed(&ticket.reminder_id, ticket.completed).await
}

/// Drives a [`ReminderSession`] against a source, one awaited call at a time.
pub struct ReminderAggregator<S> {
    source: S,
    session: ReminderSession,
}

impl<S: ReminderSource> ReminderAggregator<S> {
    pub fn new(source: S, scope: Scope, page_size: u32) -> Self {
        Self {
            source,
            session: ReminderSession::new(scope, page_size),
        }
    }

    pub fn session(&self) -> &ReminderSession {
        &self.session
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn load_initial(&mut self) -> Result<&[Reminder], FetchError> {
        self.reload().await.inspect_err(|e| error!("initial load failed: {}", e))?;
        Ok(self.session.reminders())
    }

    /// Re-read page 1, keeping the current set if the source fails.
    pub async fn refresh(&mut self) -> Result<(), FetchError> {
        self.reload().await
    }

    /// Reset to another scope and load its first page.
    pub async fn switch_scope(&mut self, scope: Scope) -> Result<&[Reminder], FetchError> {
        self.session.reset(scope);
        self.load_initial().await
    }

    /// Fetch at most one more page if nothing is loaded for `month`. Failures
    /// are logged and leave the month under-populated.
    pub async fn ensure_month_loaded(&mut self, month: Month) -> MonthPlan {
        let plan = self.session.plan_month(month);
        if let MonthPlan::Fetch(req) = &plan {
            let result = fetch(&self.source, req).await;
            if let Err(e) = self.session.apply_page(req, result) {
                warn!("backfill for {} failed: {}", month, e);
            }
        }
        plan
    }

    pub async fn toggle_completion(&mut self, reminder_id: &str) -> Result<(), CompletionError> {
        let ticket = self.session.begin_toggle(reminder_id, Utc::now())?;
        let result = send_toggle(&self.source, &ticket).await;
        self.session.finish_toggle(&ticket, result)?;
        Ok(())
    }

    async fn reload(&mut self) -> Result<(), FetchError> {
        let req = self.session.begin_load();
        let result = fetch(&self.source, &req).await;
        self.session.apply_load(&req, result).map(|_| ())
    }
}
