use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Higher value means more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderType {
    VaccineBooster,
    VetAppointment,
    Exam,
    TreatmentFollowup,
    Medication,
    Custom,
}

impl ReminderType {
    pub const ALL: [ReminderType; 6] = [
        ReminderType::VaccineBooster,
        ReminderType::VetAppointment,
        ReminderType::Exam,
        ReminderType::TreatmentFollowup,
        ReminderType::Medication,
        ReminderType::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReminderType::VaccineBooster => "Vaccine booster",
            ReminderType::VetAppointment => "Vet appointment",
            ReminderType::Exam => "Exam",
            ReminderType::TreatmentFollowup => "Treatment follow-up",
            ReminderType::Medication => "Medication",
            ReminderType::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub reminder_date: DateTime<Utc>,
    pub priority: Priority,
    pub reminder_type: ReminderType,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub pet_id: String,
    pub pet: Option<PetSummary>,
}

impl Reminder {
    /// Display name of the owning pet, resolved from `pets` when the server
    /// did not embed it.
    pub fn pet_name<'a>(&'a self, pets: &'a [Pet]) -> &'a str {
        if let Some(pet) = &self.pet {
            return &pet.name;
        }
        pets.iter()
            .find(|p| p.id == self.pet_id)
            .map(|p| p.name.as_str())
            .unwrap_or(&self.pet_id)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReminder {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    reminder_date: DateTime<Utc>,
    priority: Priority,
    reminder_type: ReminderType,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    pet_id: String,
    #[serde(default)]
    pet: Option<PetSummary>,
}

// Server rows occasionally disagree with themselves about completion; the
// flag wins and completed_at is made to match it.
impl<'de> Deserialize<'de> for Reminder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawReminder::deserialize(deserializer)?;
        let completed_at = if raw.is_completed {
            Some(raw.completed_at.unwrap_or(raw.reminder_date))
        } else {
            None
        };
        Ok(Reminder {
            id: raw.id,
            title: raw.title,
            description: raw.description.filter(|d| !d.trim().is_empty()),
            reminder_date: raw.reminder_date,
            priority: raw.priority,
            reminder_type: raw.reminder_type,
            is_completed: raw.is_completed,
            completed_at,
            pet_id: raw.pet_id,
            pet: raw.pet,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Reminder>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u32,
    pub limit: u32,
}

/// `{ "reminders": [...], "pagination": {...} }` as returned by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct ReminderListResponse {
    pub reminders: Vec<Reminder>,
    pub pagination: Pagination,
}

impl From<ReminderListResponse> for Page {
    fn from(resp: ReminderListResponse) -> Self {
        Page {
            items: resp.reminders,
            current_page: resp.pagination.current_page,
            total_pages: resp.pagination.total_pages,
            total_count: resp.pagination.total_count,
            limit: resp.pagination.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PetListResponse {
    Wrapped { pets: Vec<Pet> },
    Bare(Vec<Pet>),
}

impl PetListResponse {
    pub fn into_pets(self) -> Vec<Pet> {
        match self {
            PetListResponse::Wrapped { pets } => pets,
            PetListResponse::Bare(pets) => pets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub pet_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub reminder_date: DateTime<Utc>,
    pub priority: Priority,
    pub reminder_type: ReminderType,
}

/// Create endpoints answer either with the bare reminder or `{ "reminder": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReminderResponse {
    Wrapped { reminder: Reminder },
    Bare(Reminder),
}

impl ReminderResponse {
    pub fn into_reminder(self) -> Reminder {
        match self {
            ReminderResponse::Wrapped { reminder } => reminder,
            ReminderResponse::Bare(reminder) => reminder,
        }
    }
}
