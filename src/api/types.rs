//! API request/response types.

use serde::Serialize;

use crate::publish::{PublishResult, RepositoryInfo};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Repository block of a successful task response.
#[derive(Debug, Serialize)]
pub struct RepositoryResponse {
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub pages_url: String,
}

impl From<&RepositoryInfo> for RepositoryResponse {
    fn from(repo: &RepositoryInfo) -> Self {
        Self {
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            url: repo.url.clone(),
            pages_url: repo.pages_url.clone(),
        }
    }
}

/// Body of a `200` from `POST /task`.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub status: String,
    pub repository: Option<RepositoryResponse>,
    pub round: u32,
    pub files_created: Vec<String>,
}

impl From<&PublishResult> for TaskResponse {
    fn from(result: &PublishResult) -> Self {
        Self {
            status: "OK".to_string(),
            repository: result.repository.as_ref().map(RepositoryResponse::from),
            round: result.round,
            files_created: result.files_created.clone(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_required: Option<String>,
    /// Repository the failed operation targeted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_created: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: None,
            error: error.into(),
            details: None,
            action_required: None,
            repository: None,
            files_created: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
