use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel mediator identity recorded when a resolution is executed by the
/// platform itself rather than a human mediator.
pub const SYSTEM_MEDIATOR: Uuid = Uuid::nil();

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Pending,
    Mediation,
    Resolved,
    Escalated,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    Refund,
    Rework,
    PartialRefund,
    Arbitration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Contested-funds record tied to one completion. Terminal once Resolved;
/// the mediation deadline is a stored timestamp plus a predicate, expiry is
/// driven by an external scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: Uuid,
    pub completion_id: Uuid,
    pub contract_id: Uuid,
    pub homeowner_id: Uuid,
    pub contractor_id: Uuid,
    pub reason: String,
    pub description: String,
    pub evidence_urls: Vec<String>,
    pub status: DisputeStatus,
    pub mediation_deadline: DateTime<Utc>,
    pub messages: Vec<DisputeMessage>,
    pub resolution_path: Option<ResolutionPath>,
    pub resolution_reasoning: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    pub fn is_mediation_deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.mediation_deadline
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.homeowner_id == user_id || self.contractor_id == user_id
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, DisputeStatus::Pending | DisputeStatus::Mediation)
    }
}
