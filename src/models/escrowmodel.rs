use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Pending,
    Held,
    Disputed,
    HeldForRework,
    HeldForArbitration,
    Released,
    Refunded,
    PartialRefund,
}

impl EscrowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EscrowStatus::Released | EscrowStatus::Refunded | EscrowStatus::PartialRefund
        )
    }
}

/// What an escrow log entry records. Inbound kinds bring funds under hold,
/// outbound kinds move them out; hold markers move no money.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EscrowEntryKind {
    DepositCharge,
    FinalCharge,
    ChangeOrderCharge,
    DisputeHold,
    ReworkHold,
    ArbitrationHold,
    FinalPayout,
    PlatformFee,
    Refund,
    PartialPayout,
    PartialRefund,
}

impl EscrowEntryKind {
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            EscrowEntryKind::DepositCharge
                | EscrowEntryKind::FinalCharge
                | EscrowEntryKind::ChangeOrderCharge
        )
    }

    pub fn is_outbound(&self) -> bool {
        matches!(
            self,
            EscrowEntryKind::FinalPayout
                | EscrowEntryKind::PlatformFee
                | EscrowEntryKind::Refund
                | EscrowEntryKind::PartialPayout
                | EscrowEntryKind::PartialRefund
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowEntry {
    pub id: Uuid,
    pub kind: EscrowEntryKind,
    pub amount: BigDecimal,
    /// Gateway charge/refund/transfer id backing the movement, if any.
    pub reference: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl EscrowEntry {
    pub fn new(kind: EscrowEntryKind, amount: BigDecimal, reference: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            reference,
            recorded_at: Utc::now(),
        }
    }
}

/// Fund ledger for one contract, 1:1. The `transactions` vector is
/// append-only: current status is a projection of the log (`replay_status`)
/// and the stored `status` field must always agree with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowAccount {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub total_amount: BigDecimal,
    pub deposit_amount: BigDecimal,
    pub final_payment_amount: BigDecimal,
    pub platform_fee: BigDecimal,
    pub status: EscrowStatus,
    pub transactions: Vec<EscrowEntry>,
    pub deposit_released_at: Option<DateTime<Utc>>,
    pub final_released_at: Option<DateTime<Utc>>,
    pub rework_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EscrowAccount {
    pub fn new(
        contract_id: Uuid,
        total_amount: BigDecimal,
        deposit_amount: BigDecimal,
        final_payment_amount: BigDecimal,
        platform_fee: BigDecimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            contract_id,
            total_amount,
            deposit_amount,
            final_payment_amount,
            platform_fee,
            status: EscrowStatus::Pending,
            transactions: Vec::new(),
            deposit_released_at: None,
            final_released_at: None,
            rework_deadline: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Funds charged into escrow so far.
    pub fn inbound_total(&self) -> BigDecimal {
        self.transactions
            .iter()
            .filter(|e| e.kind.is_inbound())
            .fold(BigDecimal::from(0), |acc, e| acc + &e.amount)
    }

    /// Funds paid out, refunded, or taken as fees so far.
    pub fn outbound_total(&self) -> BigDecimal {
        self.transactions
            .iter()
            .filter(|e| e.kind.is_outbound())
            .fold(BigDecimal::from(0), |acc, e| acc + &e.amount)
    }

    /// What is currently under hold.
    pub fn held_amount(&self) -> BigDecimal {
        self.inbound_total() - self.outbound_total()
    }

    pub fn has_entry(&self, kind: EscrowEntryKind) -> bool {
        self.transactions.iter().any(|e| e.kind == kind)
    }

    pub fn entry_reference(&self, kind: EscrowEntryKind) -> Option<&str> {
        self.transactions
            .iter()
            .find(|e| e.kind == kind)
            .and_then(|e| e.reference.as_deref())
    }

    /// Derive the current status from the log alone. The stored `status`
    /// field is a cache of this projection; the two must never disagree.
    pub fn replay_status(&self) -> EscrowStatus {
        let mut state = EscrowStatus::Pending;
        for entry in &self.transactions {
            state = match entry.kind {
                EscrowEntryKind::DepositCharge
                | EscrowEntryKind::FinalCharge
                | EscrowEntryKind::ChangeOrderCharge => match state {
                    // Charges while disputed/rework keep the hold state.
                    EscrowStatus::Pending | EscrowStatus::Held => EscrowStatus::Held,
                    other => other,
                },
                EscrowEntryKind::DisputeHold => EscrowStatus::Disputed,
                EscrowEntryKind::ReworkHold => EscrowStatus::HeldForRework,
                EscrowEntryKind::ArbitrationHold => EscrowStatus::HeldForArbitration,
                EscrowEntryKind::FinalPayout => EscrowStatus::Released,
                EscrowEntryKind::PlatformFee => state,
                EscrowEntryKind::Refund => EscrowStatus::Refunded,
                EscrowEntryKind::PartialPayout => state,
                EscrowEntryKind::PartialRefund => EscrowStatus::PartialRefund,
            };
        }
        state
    }

    pub fn is_valid_transition(&self, to: EscrowStatus) -> bool {
        match (self.status, to) {
            (EscrowStatus::Pending, EscrowStatus::Held) => true,
            (EscrowStatus::Held, EscrowStatus::Released) => true,
            (EscrowStatus::Held, EscrowStatus::Disputed) => true,
            (EscrowStatus::Disputed, EscrowStatus::Refunded) => true,
            (EscrowStatus::Disputed, EscrowStatus::PartialRefund) => true,
            (EscrowStatus::Disputed, EscrowStatus::HeldForRework) => true,
            (EscrowStatus::Disputed, EscrowStatus::HeldForArbitration) => true,
            (EscrowStatus::HeldForRework, EscrowStatus::Released) => true,
            (EscrowStatus::HeldForRework, EscrowStatus::Disputed) => true,
            (EscrowStatus::HeldForRework, EscrowStatus::Refunded) => true,
            (EscrowStatus::HeldForArbitration, EscrowStatus::Released) => true,
            (EscrowStatus::HeldForArbitration, EscrowStatus::Refunded) => true,
            (EscrowStatus::HeldForArbitration, EscrowStatus::PartialRefund) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::currency::money;

    fn account() -> EscrowAccount {
        EscrowAccount::new(
            Uuid::new_v4(),
            money("500.00"),
            money("125.00"),
            money("375.00"),
            money("18.75"),
        )
    }

    #[test]
    fn replay_matches_happy_path() {
        let mut acc = account();
        acc.transactions.push(EscrowEntry::new(
            EscrowEntryKind::DepositCharge,
            money("125.00"),
            Some("ch_1".into()),
        ));
        acc.transactions.push(EscrowEntry::new(
            EscrowEntryKind::FinalCharge,
            money("375.00"),
            Some("ch_2".into()),
        ));
        assert_eq!(acc.replay_status(), EscrowStatus::Held);
        assert_eq!(acc.held_amount(), money("500.00"));

        acc.transactions.push(EscrowEntry::new(
            EscrowEntryKind::FinalPayout,
            money("481.25"),
            Some("tr_1".into()),
        ));
        acc.transactions.push(EscrowEntry::new(
            EscrowEntryKind::PlatformFee,
            money("18.75"),
            None,
        ));
        assert_eq!(acc.replay_status(), EscrowStatus::Released);
        assert_eq!(acc.held_amount(), money("0.00"));
    }

    #[test]
    fn replay_matches_partial_refund_path() {
        let mut acc = account();
        acc.transactions.push(EscrowEntry::new(
            EscrowEntryKind::DepositCharge,
            money("125.00"),
            None,
        ));
        acc.transactions.push(EscrowEntry::new(
            EscrowEntryKind::FinalCharge,
            money("375.00"),
            None,
        ));
        acc.transactions
            .push(EscrowEntry::new(EscrowEntryKind::DisputeHold, money("0.00"), None));
        assert_eq!(acc.replay_status(), EscrowStatus::Disputed);

        acc.transactions.push(EscrowEntry::new(
            EscrowEntryKind::PartialPayout,
            money("250.00"),
            None,
        ));
        acc.transactions.push(EscrowEntry::new(
            EscrowEntryKind::PartialRefund,
            money("250.00"),
            None,
        ));
        assert_eq!(acc.replay_status(), EscrowStatus::PartialRefund);
        assert_eq!(acc.held_amount(), money("0.00"));
    }

    #[test]
    fn transition_matrix_rejects_release_from_dispute() {
        let mut acc = account();
        acc.status = EscrowStatus::Disputed;
        assert!(!acc.is_valid_transition(EscrowStatus::Released));
        assert!(acc.is_valid_transition(EscrowStatus::Refunded));
        assert!(acc.is_valid_transition(EscrowStatus::HeldForRework));
    }
}
