use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    PendingApproval,
    Completed,
    Cancelled,
}

/// Binding agreement formed from exactly one accepted bid.
///
/// `deposit_amount + final_amount == amount` holds at creation and across
/// every approved change order; `split_is_conserved` is the check tests lean
/// on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub job_id: Uuid,
    pub bid_id: Uuid,
    pub homeowner_id: Uuid,
    pub contractor_id: Uuid,
    pub amount: BigDecimal,
    pub deposit_amount: BigDecimal,
    pub final_amount: BigDecimal,
    pub platform_fee: BigDecimal,
    pub contractor_net: BigDecimal,
    pub status: ContractStatus,
    pub accepted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Contract {
    pub fn split_is_conserved(&self) -> bool {
        &self.deposit_amount + &self.final_amount == self.amount
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.homeowner_id == user_id || self.contractor_id == user_id
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrderStatus {
    Pending,
    Approved,
    Rejected,
    PaymentFailed,
}

/// Additive amount adjustment to a contract. Approval charges the delta
/// first; only a successful charge mutates the contract and escrow totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeOrder {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub title: String,
    pub description: String,
    pub amount: BigDecimal,
    pub status: ChangeOrderStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}
