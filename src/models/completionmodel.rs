use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Submitted,
    Approved,
    Rejected,
    Disputed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Evidence package a contractor submits for one approval cycle. A Rejected
/// completion returns the contract to Active and a fresh one may be
/// submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCompletion {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub notes: Option<String>,
    pub geolocation: Option<GeoPoint>,
    pub status: CompletionStatus,
    pub dispute_window_expiry: DateTime<Utc>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl JobCompletion {
    pub fn is_dispute_window_open(&self, now: DateTime<Utc>) -> bool {
        now <= self.dispute_window_expiry
    }
}
