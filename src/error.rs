use thiserror::Error;

/// Failure talking to the reminder API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A reminder page could not be loaded.
#[derive(Debug, Error)]
#[error("failed to load page {page}: {source}")]
pub struct FetchError {
    pub page: u32,
    #[source]
    pub source: ApiError,
}

/// A complete or uncomplete call was rejected.
#[derive(Debug, Error)]
#[error("request for reminder {reminder_id} failed: {source}")]
pub struct RequestError {
    pub reminder_id: String,
    #[source]
    pub source: ApiError,
}

#[derive(Debug, Error)]
#[error("failed to load pets: {0}")]
pub struct PetListError(#[from] pub ApiError);

#[derive(Debug, Error)]
#[error("failed to create reminder: {0}")]
pub struct CreateError(#[from] pub ApiError);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("reminder {0} is already being updated")]
    InProgress(String),
    #[error("reminder {0} is not loaded")]
    NotFound(String),
}

impl FetchError {
    pub fn new(page: u32, source: ApiError) -> Self {
        Self { page, source }
    }
}

impl RequestError {
    pub fn new(reminder_id: impl Into<String>, source: ApiError) -> Self {
        Self {
            reminder_id: reminder_id.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> ApiError {
        ApiError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[test]
    fn messages_name_what_failed() {
        assert_eq!(
            FetchError::new(2, unavailable()).to_string(),
            "failed to load page 2: server responded 503: unavailable"
        );
        assert_eq!(
            RequestError::new("r1", unavailable()).to_string(),
            "request for reminder r1 failed: server responded 503: unavailable"
        );
        assert_eq!(
            PetListError::from(unavailable()).to_string(),
            "failed to load pets: server responded 503: unavailable"
        );
        assert_eq!(
            CreateError::from(unavailable()).to_string(),
            "failed to create reminder: server responded 503: unavailable"
        );
    }
}
