use std::fmt;

use async_trait::async_trait;

use super::models::{NewReminder, Page, Pet, Reminder};
use crate::error::{CreateError, FetchError, PetListError, RequestError};

/// Which reminder collection a session aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    All,
    Pet(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Pet(id) => write!(f, "pet:{}", id),
        }
    }
}

/// Paginated reminder provider backing the calendar.
#[async_trait]
pub trait ReminderSource: Send + Sync {
    async fn fetch_page(&self, scope: &Scope, page: u32, limit: u32) -> Result<Page, FetchError>;

    async fn set_completed(&self, reminder_id: &str, completed: bool) -> Result<(), RequestError>;

    async fn list_pets(&self) -> Result<Vec<Pet>, PetListError>;

    async fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder, CreateError>;
}
