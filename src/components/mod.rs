pub mod day_view;
pub mod help;
pub mod month_view;
pub mod reminder_form;
pub mod status_bar;

pub use day_view::DayView;
pub use month_view::MonthView;
pub use reminder_form::ReminderForm;
pub use status_bar::StatusBar;
