pub mod aggregator;
pub mod completion;
pub mod grouping;
pub mod month;
pub mod session;

pub use aggregator::ReminderAggregator;
pub use grouping::{group_by_day, CalendarIndex, DayMarks};
pub use month::Month;
pub use session::{Merge, MonthPlan, PageRequest, ReminderSession, ToggleTicket};
