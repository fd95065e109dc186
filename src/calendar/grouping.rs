use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Local, NaiveDate, TimeZone};

use super::month::Month;
use crate::api::{Priority, Reminder};

/// Reminders keyed by the local calendar day they fall on.
pub type DayIndex = HashMap<NaiveDate, Vec<Reminder>>;

/// Group reminders by local calendar day, keeping input order within a day.
pub fn group_by_day(reminders: &[Reminder]) -> DayIndex {
    group_by_day_in(reminders, &Local)
}

pub fn group_by_day_in<Tz: TimeZone>(reminders: &[Reminder], tz: &Tz) -> DayIndex {
    let mut index: DayIndex = HashMap::new();
    for r in reminders {
        index.entry(day_of(r, tz)).or_default().push(r.clone());
    }
    index
}

pub fn day_of<Tz: TimeZone>(reminder: &Reminder, tz: &Tz) -> NaiveDate {
    reminder.reminder_date.with_timezone(tz).date_naive()
}

/// Per-day summary used to decorate the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayMarks {
    pub total: usize,
    pub pending: usize,
    pub top_pending: Option<Priority>,
}

/// Derived, rebuilt-on-change view over the loaded reminders.
#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    days: DayIndex,
}

impl From<DayIndex> for CalendarIndex {
    fn from(days: DayIndex) -> Self {
        Self { days }
    }
}

impl CalendarIndex {
    pub fn build<Tz: TimeZone>(reminders: &[Reminder], tz: &Tz) -> Self {
        Self {
            days: group_by_day_in(reminders, tz),
        }
    }

    pub fn on(&self, day: NaiveDate) -> &[Reminder] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_month(&self, month: Month) -> bool {
        self.days.keys().any(|d| month.contains(*d))
    }

    pub fn days_in(&self, month: Month) -> BTreeMap<u32, DayMarks> {
        let mut marks = BTreeMap::new();
        for (date, reminders) in self.days.iter().filter(|(d, _)| month.contains(**d)) {
            let pending: Vec<&Reminder> = reminders.iter().filter(|r| !r.is_completed).collect();
            marks.insert(
                date.day(),
                DayMarks {
                    total: reminders.len(),
                    pending: pending.len(),
                    top_pending: pending.iter().map(|r| r.priority).max_by_key(|p| p.rank()),
                },
            );
        }
        marks
    }
}
