use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex;

use super::models::{NewReminder, Page, Pet, Priority, Reminder, ReminderType};
use super::source::{ReminderSource, Scope};
use crate::error::{ApiError, CreateError, FetchError, PetListError, RequestError};

/// In-memory reminder source for tests. Serves `reminders` in fixed-size pages.
pub struct FakeSource {
    pub reminders: Mutex<HashMap<Scope, Vec<Reminder>>>,
    pub pets: Mutex<Vec<Pet>>,
    pub requested_pages: Mutex<Vec<u32>>,
    pub fetch_calls: AtomicU64,
    pub toggle_calls: AtomicU64,
    pub fail_fetch: bool,
    pub fail_toggle: bool,
    pub fail_create: bool,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self {
            reminders: Mutex::new(HashMap::new()),
            pets: Mutex::new(Vec::new()),
            requested_pages: Mutex::new(Vec::new()),
            fetch_calls: AtomicU64::new(0),
            toggle_calls: AtomicU64::new(0),
            fail_fetch: false,
            fail_toggle: false,
            fail_create: false,
        }
    }
}

impl FakeSource {
    pub fn with(scope: Scope, reminders: Vec<Reminder>) -> Self {
        let fake = Self::default();
        fake.reminders
            .try_lock()
            .expect("fresh fake")
            .insert(scope, reminders);
        fake
    }

    pub fn fetches(&self) -> u64 {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    pub fn toggles(&self) -> u64 {
        self.toggle_calls.load(Ordering::Relaxed)
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "unavailable".to_string(),
    }
}

#[async_trait]
impl ReminderSource for FakeSource {
    async fn fetch_page(&self, scope: &Scope, page: u32, limit: u32) -> Result<Page, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        self.requested_pages.lock().await.push(page);
        if self.fail_fetch {
            return Err(FetchError::new(page, server_error()));
        }
        let all = self.reminders.lock().await;
        let items = all.get(scope).cloned().unwrap_or_default();
        let total = items.len() as u32;
        let start = ((page - 1) * limit) as usize;
        let slice: Vec<Reminder> = items.into_iter().skip(start).take(limit as usize).collect();
        Ok(Page {
            items: slice,
            current_page: page,
            total_pages: total.div_ceil(limit).max(1),
            total_count: total,
            limit,
        })
    }

    async fn set_completed(&self, reminder_id: &str, completed: bool) -> Result<(), RequestError> {
        self.toggle_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_toggle {
            return Err(RequestError::new(reminder_id, server_error()));
        }
        let mut all = self.reminders.lock().await;
        for r in all.values_mut().flatten().filter(|r| r.id == reminder_id) {
            r.is_completed = completed;
            r.completed_at = completed.then(Utc::now);
        }
        Ok(())
    }

    async fn list_pets(&self) -> Result<Vec<Pet>, PetListError> {
        if self.fail_fetch {
            return Err(server_error().into());
        }
        Ok(self.pets.lock().await.clone())
    }

    async fn create_reminder(&self, new: &NewReminder) -> Result<Reminder, CreateError> {
        if self.fail_create {
            return Err(server_error().into());
        }
        let mut all = self.reminders.lock().await;
        let list = all.entry(Scope::All).or_default();
        let created = Reminder {
            id: format!("created-{}", list.len() + 1),
            title: new.title.clone(),
            description: new.description.clone(),
            reminder_date: new.reminder_date,
            priority: new.priority,
            reminder_type: new.reminder_type,
            is_completed: false,
            completed_at: None,
            pet_id: new.pet_id.clone(),
            pet: None,
        };
        list.insert(0, created.clone());
        Ok(created)
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// An incomplete reminder for pet `p1` due at `date`.
pub fn reminder(id: &str, date: DateTime<Utc>) -> Reminder {
    Reminder {
        id: id.to_string(),
        title: format!("Reminder {}", id),
        description: None,
        reminder_date: date,
        priority: Priority::Medium,
        reminder_type: ReminderType::Custom,
        is_completed: false,
        completed_at: None,
        pet_id: "p1".to_string(),
        pet: None,
    }
}
