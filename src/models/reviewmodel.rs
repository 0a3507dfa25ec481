use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal contractor profile the lifecycle engine needs: the live aggregate
/// rating (mean of all reviews, recomputed in full) and a completed-job
/// counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorProfile {
    pub user_id: Uuid,
    pub display_name: String,
    pub rating: Option<f32>,
    pub completed_jobs: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractorProfile {
    pub fn new(user_id: Uuid, display_name: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            display_name,
            rating: None,
            completed_jobs: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub contractor_id: Uuid,
    pub reviewer_id: Uuid,
    pub rating: i32,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}
