use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

/// Role resolved by the auth layer before a call reaches the core. The core
/// only authorizes against entity ownership plus this role.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Homeowner,
    Contractor,
    Arbiter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub homeowner_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(homeowner_id: Uuid, title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            homeowner_id,
            title,
            description,
            status: JobStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_accepting_bids(&self) -> bool {
        self.status == JobStatus::Open
    }
}
