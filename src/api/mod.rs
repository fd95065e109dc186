pub mod client;
#[cfg(test)]
pub mod fake;
pub mod models;
pub mod source;

pub use client::ApiClient;
pub use models::{NewReminder, Page, Pet, Priority, Reminder, ReminderType};
pub use source::{ReminderSource, Scope};
