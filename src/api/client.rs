use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::{
    NewReminder, Page, Pet, PetListResponse, Reminder, ReminderListResponse, ReminderResponse,
};
use super::source::{ReminderSource, Scope};
use crate::config::Config;
use crate::error::{ApiError, CreateError, FetchError, PetListError, RequestError};

/// HTTP client for the pet health REST API.
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_url, config.token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn reminders_path(scope: &Scope) -> String {
        match scope {
            Scope::All => "/reminders".to_string(),
            Scope::Pet(id) => format!("/pets/{}/reminders", id),
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = self.authorize(req).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.send(req).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ReminderSource for ApiClient {
    async fn fetch_page(&self, scope: &Scope, page: u32, limit: u32) -> Result<Page, FetchError> {
        debug!("GET reminders scope={} page={} limit={}", scope, page, limit);
        let req = self
            .http
            .get(self.url(&Self::reminders_path(scope)))
            .query(&[("page", page), ("limit", limit)]);
        let resp: ReminderListResponse =
            self.json(req).await.map_err(|e| FetchError::new(page, e))?;
        Ok(resp.into())
    }

    async fn set_completed(&self, reminder_id: &str, completed: bool) -> Result<(), RequestError> {
        let action = if completed { "complete" } else { "uncomplete" };
        debug!("PATCH reminder {} {}", reminder_id, action);
        let req = self
            .http
            .patch(self.url(&format!("/reminders/{}/{}", reminder_id, action)));
        self.send(req)
            .await
            .map(|_| ())
            .map_err(|e| RequestError::new(reminder_id, e))
    }

    async fn list_pets(&self) -> Result<Vec<Pet>, PetListError> {
        let req = self.http.get(self.url("/pets"));
        let resp: PetListResponse = self.json(req).await?;
        Ok(resp.into_pets())
    }

    async fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder, CreateError> {
        debug!("POST reminder for pet {}", reminder.pet_id);
        let req = self.http.post(self.url("/reminders")).json(reminder);
        let resp: ReminderResponse = self.json(req).await?;
        Ok(resp.into_reminder())
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
