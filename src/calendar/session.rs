use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};

use super::completion::{self, CompletionState};
use super::grouping::{group_by_day, CalendarIndex};
use super::month::Month;
use crate::api::{Page, Reminder, Scope};
use crate::error::{FetchError, RequestError, ToggleError};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Pages fetched per session before month backfill gives up.
pub const MAX_PAGES: u32 = 10;

/// A page fetch the session has reserved. Results must be handed back with
/// the same request so stale ones can be recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub scope: Scope,
    pub page: u32,
    pub limit: u32,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CapExceeded,
    AlreadyFetched(u32),
    InFlight(u32),
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthPlan {
    /// At least one loaded reminder falls in the month.
    Covered,
    /// No initial page yet, or it came back empty.
    NotLoaded,
    Fetch(PageRequest),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Applied { added: usize },
    Stale,
}

/// An optimistic completion change awaiting the server's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleTicket {
    pub reminder_id: String,
    pub completed: bool,
    prior: CompletionState,
    epoch: u64,
}

/// Target of a toggle still awaiting the server, re-applied over fresh pages.
#[derive(Debug, Clone, Copy)]
struct PendingToggle {
    completed: bool,
    at: DateTime<Utc>,
}

/// Accumulated reminders for one scope, plus the bookkeeping that keeps page
/// fetches monotonic and completion toggles serialized per reminder.
#[derive(Debug, Clone)]
pub struct ReminderSession {
    scope: Scope,
    page_size: u32,
    // Bumped on scope change; guards toggles.
    epoch: u64,
    // Bumped on scope change and refresh; guards page results.
    generation: u64,
    loaded: bool,
    reminders: Vec<Reminder>,
    ids: HashSet<String>,
    fetched_pages: BTreeSet<u32>,
    in_flight_pages: BTreeSet<u32>,
    total_pages: Option<u32>,
    toggling: HashMap<String, PendingToggle>,
    index: CalendarIndex,
}

impl ReminderSession {
    pub fn new(scope: Scope, page_size: u32) -> Self {
        Self {
            scope,
            page_size: page_size.max(1),
            epoch: 0,
            generation: 0,
            loaded: false,
            reminders: Vec::new(),
            ids: HashSet::new(),
            fetched_pages: BTreeSet::new(),
            in_flight_pages: BTreeSet::new(),
            total_pages: None,
            toggling: HashMap::new(),
            index: CalendarIndex::default(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn get(&self, id: &str) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    pub fn fetched_pages(&self) -> &BTreeSet<u32> {
        &self.fetched_pages
    }

    pub fn pages_in_flight(&self) -> usize {
        self.in_flight_pages.len()
    }

    pub fn is_toggling(&self, id: &str) -> bool {
        self.toggling.contains_key(id)
    }

    pub fn index(&self) -> &CalendarIndex {
        &self.index
    }

    pub fn on(&self, day: NaiveDate) -> &[Reminder] {
        self.index.on(day)
    }

    /// Drop everything accumulated and start over under `scope`.
    pub fn reset(&mut self, scope: Scope) {
        let page_size = self.page_size;
        let epoch = self.epoch + 1;
        let generation = self.generation + 1;
        *self = Self::new(scope, page_size);
        self.epoch = epoch;
        self.generation = generation;
    }

    /// Reserve a fetch of page 1. Any outstanding page results become stale.
    pub fn begin_load(&mut self) -> PageRequest {
        self.generation += 1;
        self.in_flight_pages.clear();
        self.in_flight_pages.insert(1);
        self.request(1)
    }

    /// Replace the collection with page 1. On failure the collection is left
    /// as it was: empty for an initial load, untouched for a refresh.
    pub fn apply_load(
        &mut self,
        req: &PageRequest,
        result: Result<Page, FetchError>,
    ) -> Result<Merge, FetchError> {
        if !self.is_current(req) {
            debug!("dropping stale page {} for {}", req.page, req.scope);
            return Ok(Merge::Stale);
        }
        self.in_flight_pages.remove(&req.page);
        let page = result?;

        self.reminders.clear();
        self.ids.clear();
        self.fetched_pages.clear();
        let added = self.merge_items(page.items);
        self.reapply_pending();
        self.fetched_pages.insert(req.page);
        self.total_pages = Some(page.total_pages);
        self.loaded = true;
        self.rebuild_index();
        debug!("loaded {} reminders for {}", added, self.scope);
        Ok(Merge::Applied { added })
    }

    /// Decide whether `month` needs another page, reserving it if so.
    pub fn plan_month(&mut self, month: Month) -> MonthPlan {
        if self.index.has_month(month) {
            return MonthPlan::Covered;
        }
        if !self.loaded || self.reminders.is_empty() {
            return MonthPlan::NotLoaded;
        }

        let page = self.reminders.len() as u32 / self.page_size + 1;
        let reason = if page > MAX_PAGES || self.fetched_pages.len() as u32 >= MAX_PAGES {
            Some(SkipReason::CapExceeded)
        } else if self.fetched_pages.contains(&page) {
            if let Some(total) = self.total_pages.filter(|&total| page < total) {
                debug!(
                    "backfill stalled at page {} of {}: overlapping pages left {} reminders",
                    page,
                    total,
                    self.reminders.len()
                );
            }
            Some(SkipReason::AlreadyFetched(page))
        } else if self.in_flight_pages.contains(&page) {
            Some(SkipReason::InFlight(page))
        } else if self.total_pages.is_some_and(|total| page > total) {
            Some(SkipReason::Exhausted)
        } else {
            None
        };

        if let Some(reason) = reason {
            debug!("not backfilling {} for {}: {:?}", month, self.scope, reason);
            return MonthPlan::Skip(reason);
        }

        self.in_flight_pages.insert(page);
        MonthPlan::Fetch(self.request(page))
    }

    /// Merge a backfilled page, skipping reminders whose id is already loaded.
    pub fn apply_page(
        &mut self,
        req: &PageRequest,
        result: Result<Page, FetchError>,
    ) -> Result<Merge, FetchError> {
        if !self.is_current(req) {
            debug!("dropping stale page {} for {}", req.page, req.scope);
            return Ok(Merge::Stale);
        }
        self.in_flight_pages.remove(&req.page);
        let page = result?;

        let added = self.merge_items(page.items);
        self.reapply_pending();
        self.fetched_pages.insert(req.page);
        self.total_pages = Some(page.total_pages);
        self.rebuild_index();
        debug!("merged page {} for {}: {} new", req.page, self.scope, added);
        Ok(Merge::Applied { added })
    }

    /// Flip completion locally before the server is asked.
    pub fn begin_toggle(&mut self, id: &str, now: DateTime<Utc>) -> Result<ToggleTicket, ToggleError> {
        if self.toggling.contains_key(id) {
            return Err(ToggleError::InProgress(id.to_string()));
        }
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ToggleError::NotFound(id.to_string()))?;

        let prior = CompletionState::of(reminder);
        let completed = !reminder.is_completed;
        *reminder = completion::apply(reminder, completed, now);

        self.toggling
            .insert(id.to_string(), PendingToggle { completed, at: now });
        self.rebuild_index();
        Ok(ToggleTicket {
            reminder_id: id.to_string(),
            completed,
            prior,
            epoch: self.epoch,
        })
    }

    /// Settle a toggle. A rejected request restores the pre-toggle fields.
    pub fn finish_toggle(
        &mut self,
        ticket: &ToggleTicket,
        result: Result<(), RequestError>,
    ) -> Result<(), RequestError> {
        if ticket.epoch != self.epoch {
            debug!("ignoring toggle of {} from a previous scope", ticket.reminder_id);
            return Ok(());
        }
        self.toggling.remove(&ticket.reminder_id);

        if let Err(err) = result {
            warn!("reverting {}: {}", ticket.reminder_id, err);
            if let Some(r) = self.reminders.iter_mut().find(|r| r.id == ticket.reminder_id) {
                ticket.prior.restore(r);
            }
            self.rebuild_index();
            return Err(err);
        }
        Ok(())
    }

    fn request(&self, page: u32) -> PageRequest {
        PageRequest {
            scope: self.scope.clone(),
            page,
            limit: self.page_size,
            generation: self.generation,
        }
    }

    fn is_current(&self, req: &PageRequest) -> bool {
        req.generation == self.generation && req.scope == self.scope
    }

    fn merge_items(&mut self, items: Vec<Reminder>) -> usize {
        let before = self.reminders.len();
        for item in items {
            if self.ids.insert(item.id.clone()) {
                self.reminders.push(item);
            }
        }
        self.reminders.len() - before
    }

    // Fresh server copies may predate an accepted PATCH.
    fn reapply_pending(&mut self) {
        for r in self.reminders.iter_mut() {
            if let Some(pending) = self.toggling.get(&r.id) {
                *r = completion::apply(r, pending.completed, pending.at);
            }
        }
    }

    fn rebuild_index(&mut self) {
        self.index = group_by_day(&self.reminders).into();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::api::fake::{at, reminder};
    use crate::error::ApiError;

    fn page(items: Vec<Reminder>, current: u32, total_pages: u32) -> Page {
        let total_count = items.len() as u32;
        Page {
            items,
            current_page: current,
            total_pages,
            total_count,
            limit: DEFAULT_PAGE_SIZE,
        }
    }

    fn june(n: usize, prefix: &str) -> Vec<Reminder> {
        (0..n)
            .map(|i| reminder(&format!("{}{}", prefix, i), at(2024, 6, 10 + (i % 10) as u32, 12)))
            .collect()
    }

    fn loaded(items: Vec<Reminder>, total_pages: u32) -> ReminderSession {
        let mut s = ReminderSession::new(Scope::All, DEFAULT_PAGE_SIZE);
        let req = s.begin_load();
        s.apply_load(&req, Ok(page(items, 1, total_pages))).unwrap();
        s
    }

    fn failure(page: u32) -> FetchError {
        FetchError::new(page, ApiError::Status { status: 500, message: "boom".into() })
    }

    fn may() -> Month {
        Month::new(2024, 5).unwrap()
    }

    #[test]
    fn failed_initial_load_leaves_set_empty() {
        let mut s = ReminderSession::new(Scope::All, DEFAULT_PAGE_SIZE);
        let req = s.begin_load();
        assert!(s.apply_load(&req, Err(failure(1))).is_err());
        assert!(s.reminders().is_empty());
        assert!(!s.is_loaded());
        assert_eq!(s.plan_month(may()), MonthPlan::NotLoaded);
    }

    #[test]
    fn failed_refresh_keeps_current_set() {
        let mut s = loaded(june(3, "a"), 1);
        let req = s.begin_load();
        assert!(s.apply_load(&req, Err(failure(1))).is_err());
        assert_eq!(s.reminders().len(), 3);
    }

    #[test]
    fn covered_month_is_a_no_op() {
        let mut s = loaded(june(3, "a"), 1);
        assert_eq!(s.plan_month(Month::new(2024, 6).unwrap()), MonthPlan::Covered);
        assert_eq!(s.pages_in_flight(), 0);
    }

    #[test]
    fn backfill_requests_next_page_once() {
        let mut s = loaded(june(20, "a"), 2);
        let MonthPlan::Fetch(req) = s.plan_month(may()) else { panic!("expected a fetch") };
        assert_eq!(req.page, 2);
        // A second navigation while page 2 is outstanding must not duplicate it.
        assert_eq!(s.plan_month(may()), MonthPlan::Skip(SkipReason::InFlight(2)));
    }

    #[test]
    fn merge_drops_duplicate_ids() {
        let mut s = loaded(june(20, "a"), 3);
        let MonthPlan::Fetch(req) = s.plan_month(may()) else { panic!() };
        // The remote shifted: page 2 repeats two items from page 1.
        let mut items = june(2, "a");
        items.extend(june(18, "b"));
        let merged = s.apply_page(&req, Ok(page(items, 2, 3))).unwrap();

        assert_eq!(merged, Merge::Applied { added: 18 });
        let ids: HashSet<&str> = s.reminders().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), s.reminders().len());
        assert_eq!(s.reminders().len(), 38);
    }

    #[test]
    fn never_refetches_a_fetched_page() {
        let mut s = loaded(june(20, "a"), 3);
        let MonthPlan::Fetch(req) = s.plan_month(may()) else { panic!() };
        // Everything on page 2 was already seen, so the count does not advance.
        s.apply_page(&req, Ok(page(june(20, "a"), 2, 3))).unwrap();
        assert_eq!(s.reminders().len(), 20);
        assert_eq!(s.plan_month(may()), MonthPlan::Skip(SkipReason::AlreadyFetched(2)));
    }

    #[test]
    fn stops_at_page_cap() {
        let mut s = loaded(june(20, "p1-"), 50);
        for n in 2..=MAX_PAGES {
            let MonthPlan::Fetch(req) = s.plan_month(may()) else { panic!("page {}", n) };
            assert_eq!(req.page, n);
            s.apply_page(&req, Ok(page(june(20, &format!("p{}-", n)), n, 50))).unwrap();
        }
        assert_eq!(s.fetched_pages().len() as u32, MAX_PAGES);
        assert_eq!(s.plan_month(may()), MonthPlan::Skip(SkipReason::CapExceeded));
    }

    #[test]
    fn stops_when_source_is_exhausted() {
        let mut s = loaded(june(20, "a"), 1);
        assert_eq!(s.plan_month(may()), MonthPlan::Skip(SkipReason::Exhausted));
    }

    #[test]
    fn failed_backfill_releases_the_page() {
        let mut s = loaded(june(20, "a"), 2);
        let MonthPlan::Fetch(req) = s.plan_month(may()) else { panic!() };
        assert!(s.apply_page(&req, Err(failure(2))).is_err());
        assert_eq!(s.reminders().len(), 20);
        assert!(!s.fetched_pages().contains(&2));
        assert!(matches!(s.plan_month(may()), MonthPlan::Fetch(_)));
    }

    #[test]
    fn results_from_previous_scope_are_discarded() {
        let mut s = loaded(june(20, "a"), 2);
        let MonthPlan::Fetch(req) = s.plan_month(may()) else { panic!() };
        s.reset(Scope::Pet("p2".into()));

        let merged = s.apply_page(&req, Ok(page(june(5, "b"), 2, 2))).unwrap();
        assert_eq!(merged, Merge::Stale);
        assert!(s.reminders().is_empty());
        assert!(s.fetched_pages().is_empty());
    }

    #[test]
    fn refresh_makes_outstanding_backfill_stale() {
        let mut s = loaded(june(20, "a"), 2);
        let MonthPlan::Fetch(backfill) = s.plan_month(may()) else { panic!() };
        let reload = s.begin_load();
        s.apply_load(&reload, Ok(page(june(20, "a"), 1, 2))).unwrap();
        assert_eq!(s.apply_page(&backfill, Ok(page(june(5, "c"), 2, 2))).unwrap(), Merge::Stale);
        assert_eq!(s.reminders().len(), 20);
    }

    #[test]
    fn june_may_scenario() {
        let items = june(25, "r");
        let mut s = loaded(items[..20].to_vec(), 2);
        let MonthPlan::Fetch(req) = s.plan_month(may()) else { panic!() };
        assert_eq!(req.page, 2);
        s.apply_page(&req, Ok(page(items[20..].to_vec(), 2, 2))).unwrap();

        assert_eq!(s.reminders().len(), 25);
        assert_eq!(s.fetched_pages().iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(s.plan_month(may()), MonthPlan::Skip(SkipReason::AlreadyFetched(2)));
    }

    #[test]
    fn toggle_is_applied_before_the_request_and_reverted_on_failure() {
        let mut s = loaded(vec![reminder("r1", at(2024, 6, 12, 12))], 1);
        let ticket = s.begin_toggle("r1", at(2024, 6, 13, 8)).unwrap();

        let r1 = s.get("r1").unwrap();
        assert!(r1.is_completed);
        assert!(r1.completed_at.is_some());
        assert!(s.is_toggling("r1"));

        let err = RequestError::new("r1", ApiError::Status { status: 500, message: "x".into() });
        assert!(s.finish_toggle(&ticket, Err(err)).is_err());
        let r1 = s.get("r1").unwrap();
        assert!(!r1.is_completed);
        assert_eq!(r1.completed_at, None);
        assert!(!s.is_toggling("r1"));
    }

    #[test]
    fn successful_toggle_keeps_optimistic_state() {
        let mut done = reminder("r1", at(2024, 6, 12, 12));
        done.is_completed = true;
        done.completed_at = Some(at(2024, 6, 12, 13));
        let mut s = loaded(vec![done], 1);

        let ticket = s.begin_toggle("r1", at(2024, 6, 13, 8)).unwrap();
        s.finish_toggle(&ticket, Ok(())).unwrap();
        let r1 = s.get("r1").unwrap();
        assert!(!r1.is_completed);
        assert_eq!(r1.completed_at, None);
        assert!(!s.on(r1.reminder_date.with_timezone(&Local).date_naive())[0].is_completed);
    }

    #[test]
    fn refresh_during_toggle_keeps_the_pending_change() {
        let mut s = loaded(vec![reminder("r1", at(2024, 6, 12, 12))], 1);
        let ticket = s.begin_toggle("r1", at(2024, 6, 13, 8)).unwrap();

        // The reload was served before the server saw the PATCH.
        let reload = s.begin_load();
        s.apply_load(&reload, Ok(page(vec![reminder("r1", at(2024, 6, 12, 12))], 1, 1)))
            .unwrap();
        assert!(s.get("r1").unwrap().is_completed);

        s.finish_toggle(&ticket, Ok(())).unwrap();
        let r1 = s.get("r1").unwrap();
        assert!(r1.is_completed);
        assert_eq!(r1.completed_at, Some(at(2024, 6, 13, 8)));
        assert!(!s.is_toggling("r1"));
        assert!(s.on(r1.reminder_date.with_timezone(&Local).date_naive())[0].is_completed);
    }

    #[test]
    fn rejected_toggle_after_refresh_still_reverts() {
        let mut s = loaded(vec![reminder("r1", at(2024, 6, 12, 12))], 1);
        let ticket = s.begin_toggle("r1", at(2024, 6, 13, 8)).unwrap();
        let reload = s.begin_load();
        s.apply_load(&reload, Ok(page(vec![reminder("r1", at(2024, 6, 12, 12))], 1, 1)))
            .unwrap();

        let err = RequestError::new("r1", ApiError::Status { status: 409, message: "x".into() });
        assert!(s.finish_toggle(&ticket, Err(err)).is_err());
        assert!(!s.get("r1").unwrap().is_completed);
    }

    #[test]
    fn toggle_from_previous_scope_is_ignored() {
        let mut s = loaded(vec![reminder("r1", at(2024, 6, 12, 12))], 1);
        let ticket = s.begin_toggle("r1", at(2024, 6, 13, 8)).unwrap();
        s.reset(Scope::Pet("p2".into()));

        let err = RequestError::new("r1", ApiError::Status { status: 500, message: "x".into() });
        assert!(s.finish_toggle(&ticket, Err(err)).is_ok());
        assert!(s.reminders().is_empty());
        assert!(!s.is_toggling("r1"));
        assert_eq!(s.scope(), &Scope::Pet("p2".into()));
    }

    #[test]
    fn stale_ticket_leaves_same_id_in_new_scope_alone() {
        let mut s = loaded(vec![reminder("r1", at(2024, 6, 12, 12))], 1);
        let stale = s.begin_toggle("r1", at(2024, 6, 13, 8)).unwrap();
        s.reset(Scope::Pet("p1".into()));

        let mut done = reminder("r1", at(2024, 6, 12, 12));
        done.is_completed = true;
        done.completed_at = Some(at(2024, 6, 12, 13));
        let req = s.begin_load();
        s.apply_load(&req, Ok(page(vec![done.clone()], 1, 1))).unwrap();
        let fresh = s.begin_toggle("r1", at(2024, 6, 14, 8)).unwrap();

        let err = RequestError::new("r1", ApiError::Status { status: 500, message: "x".into() });
        assert!(s.finish_toggle(&stale, Err(err)).is_ok());
        // Still showing the new scope's own pending reopen.
        let r1 = s.get("r1").unwrap();
        assert!(!r1.is_completed);
        assert!(s.is_toggling("r1"));

        s.finish_toggle(&fresh, Ok(())).unwrap();
        assert!(!s.is_toggling("r1"));
    }

    #[test]
    fn concurrent_toggle_on_same_id_is_rejected() {
        let mut s = loaded(
            vec![reminder("r1", at(2024, 6, 12, 12)), reminder("r2", at(2024, 6, 12, 12))],
            1,
        );
        s.begin_toggle("r1", at(2024, 6, 13, 8)).unwrap();
        assert_eq!(
            s.begin_toggle("r1", at(2024, 6, 13, 8)),
            Err(ToggleError::InProgress("r1".into()))
        );
        assert!(s.begin_toggle("r2", at(2024, 6, 13, 8)).is_ok());
        assert_eq!(
            s.begin_toggle("nope", at(2024, 6, 13, 8)),
            Err(ToggleError::NotFound("nope".into()))
        );
    }

    #[test]
    fn completion_invariant_holds_after_any_toggle_sequence() {
        let mut s = loaded(june(5, "r"), 1);
        for round in 0..3u32 {
            for i in 0..5 {
                let id = format!("r{}", i);
                let ticket = s.begin_toggle(&id, at(2024, 6, 20, round)).unwrap();
                let result = if (i + round as usize) % 2 == 0 {
                    Ok(())
                } else {
                    Err(RequestError::new(&id, ApiError::Status { status: 409, message: "x".into() }))
                };
                let _ = s.finish_toggle(&ticket, result);
            }
        }
        for r in s.reminders() {
            assert_eq!(r.is_completed, r.completed_at.is_some(), "{}", r.id);
        }
    }
}
