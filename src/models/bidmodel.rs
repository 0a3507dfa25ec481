use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::jobmodel::{Job, UserRole};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Submitted,
    Accepted,
    Rejected,
    Withdrawn,
}

/// One contractor's offer on a job. Unique on (job_id, contractor_id);
/// immutable once Accepted or Rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub job_id: Uuid,
    pub contractor_id: Uuid,
    pub amount: BigDecimal,
    pub timeline_days: i32,
    pub proposal: String,
    /// Contractor rating captured at submission time, kept for display even
    /// if the live rating later changes.
    pub contractor_rating_snapshot: Option<f32>,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bid {
    pub fn is_open(&self) -> bool {
        self.status == BidStatus::Submitted
    }
}

/// Who is looking at a job's bid list. Resolved once per call, then matched
/// exhaustively; blind bidding hangs off this distinction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerContext {
    JobOwner,
    Bidder(Uuid),
    Arbiter,
    Other,
}

impl ViewerContext {
    pub fn resolve(job: &Job, viewer_id: Uuid, viewer_role: UserRole, has_bid: bool) -> Self {
        if job.homeowner_id == viewer_id {
            ViewerContext::JobOwner
        } else if viewer_role == UserRole::Arbiter {
            ViewerContext::Arbiter
        } else if has_bid {
            ViewerContext::Bidder(viewer_id)
        } else {
            ViewerContext::Other
        }
    }
}
