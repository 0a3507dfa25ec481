// service/escrow_service.rs
use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::Config,
    models::{
        contractmodel::Contract,
        escrowmodel::{EscrowAccount, EscrowEntry, EscrowEntryKind, EscrowStatus},
    },
    service::{audit_service::AuditService, error::ServiceError, payment_provider::PaymentGateway},
    store::{escrowstore::EscrowExt, store::StoreClient},
};

/// Escrow Ledger: the single source of truth for where a contract's money
/// is. Every mutation validates the state transition, appends to the
/// account's transaction log, and persists through the store's append-only
/// guard; prior entries are never rewritten.
#[derive(Debug, Clone)]
pub struct EscrowService {
    store: Arc<StoreClient>,
    gateway: Arc<dyn PaymentGateway>,
    audit_service: Arc<AuditService>,
    config: Arc<Config>,
}

impl EscrowService {
    pub fn new(
        store: Arc<StoreClient>,
        gateway: Arc<dyn PaymentGateway>,
        audit_service: Arc<AuditService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            gateway,
            audit_service,
            config,
        }
    }

    async fn load(&self, contract_id: Uuid) -> Result<EscrowAccount, ServiceError> {
        self.store
            .get_escrow_by_contract_id(contract_id)
            .await?
            .ok_or(ServiceError::EscrowNotFound(contract_id))
    }

    fn check_transition(
        account: &EscrowAccount,
        to: EscrowStatus,
    ) -> Result<(), ServiceError> {
        if account.status.is_terminal() {
            return Err(ServiceError::EscrowAlreadyResolved(account.contract_id));
        }
        if !account.is_valid_transition(to) {
            return Err(ServiceError::InvalidEscrowTransition(account.status, to));
        }
        Ok(())
    }

    /// Create the account for a freshly formed contract and record the
    /// deposit charge. The charge itself has already been executed by the
    /// caller (outside any lock, with an idempotency key); this records it.
    pub async fn create_escrow(
        &self,
        contract: &Contract,
        deposit_charge_ref: String,
    ) -> Result<EscrowAccount, ServiceError> {
        let mut account = EscrowAccount::new(
            contract.id,
            contract.amount.clone(),
            contract.deposit_amount.clone(),
            contract.final_amount.clone(),
            contract.platform_fee.clone(),
        );
        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::DepositCharge,
            contract.deposit_amount.clone(),
            Some(deposit_charge_ref),
        ));
        account.status = EscrowStatus::Held;

        let account = self.store.insert_escrow_account(account).await?;
        self.audit_service
            .log_event(
                contract.homeowner_id,
                "escrow_created",
                Some(account.id),
                Some(serde_json::json!({
                    "contract_id": contract.id,
                    "deposit": contract.deposit_amount.to_string(),
                })),
                "Escrow account opened with deposit under hold".to_string(),
            )
            .await?;
        Ok(account)
    }

    /// Charge whatever remains of the contract amount into escrow. Called
    /// when a completion enters review so that dispute holds cover the full
    /// amount. Idempotent across resubmissions.
    pub async fn charge_remaining_balance(
        &self,
        contract: &Contract,
    ) -> Result<EscrowAccount, ServiceError> {
        let mut account = self.load(contract.id).await?;
        if account.status.is_terminal() {
            return Err(ServiceError::EscrowAlreadyResolved(contract.id));
        }

        let outstanding = &account.total_amount - account.inbound_total();
        if outstanding <= BigDecimal::from(0) {
            return Ok(account);
        }

        let key = format!("{}:final", contract.id);
        let reference = self
            .gateway
            .charge(&outstanding, &contract.homeowner_id.to_string(), &key)
            .await?;

        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::FinalCharge,
            outstanding.clone(),
            Some(reference),
        ));
        if account.status == EscrowStatus::Pending {
            account.status = EscrowStatus::Held;
        }
        account.updated_at = Utc::now();
        let account = self.store.update_escrow_account(account).await?;

        tracing::info!(
            contract_id = %contract.id,
            amount = %outstanding,
            "final escrow balance charged"
        );
        Ok(account)
    }

    /// Grow the account in step with an approved change order. The delta has
    /// already been charged by the caller; this records the charge and
    /// re-derives the account's split figures from the updated contract.
    pub async fn apply_change_order(
        &self,
        contract: &Contract,
        delta: &BigDecimal,
        charge_ref: String,
    ) -> Result<EscrowAccount, ServiceError> {
        let mut account = self.load(contract.id).await?;
        if account.status.is_terminal() {
            return Err(ServiceError::EscrowAlreadyResolved(contract.id));
        }
        if account.status != EscrowStatus::Held {
            return Err(ServiceError::InvalidEscrowTransition(
                account.status,
                EscrowStatus::Held,
            ));
        }

        account.total_amount = contract.amount.clone();
        account.deposit_amount = contract.deposit_amount.clone();
        account.final_payment_amount = contract.final_amount.clone();
        account.platform_fee = contract.platform_fee.clone();
        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::ChangeOrderCharge,
            delta.clone(),
            Some(charge_ref),
        ));
        account.updated_at = Utc::now();
        Ok(self.store.update_escrow_account(account).await?)
    }

    /// Release the held funds to the contractor: one payout entry and one
    /// platform-fee entry, recorded together or not at all.
    pub async fn release_final_payment(
        &self,
        contract: &Contract,
    ) -> Result<EscrowAccount, ServiceError> {
        let mut account = self.load(contract.id).await?;
        Self::check_transition(&account, EscrowStatus::Released)?;

        if account.held_amount() != account.total_amount {
            return Err(ServiceError::Validation(
                "escrow is not fully funded for release".to_string(),
            ));
        }

        let payout = &account.total_amount - &account.platform_fee;
        let key = format!("{}:release", contract.id);
        let transfer_ref = self
            .gateway
            .transfer(&payout, &contract.contractor_id.to_string(), &key)
            .await?;

        let now = Utc::now();
        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::FinalPayout,
            payout.clone(),
            Some(transfer_ref),
        ));
        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::PlatformFee,
            account.platform_fee.clone(),
            None,
        ));
        account.status = EscrowStatus::Released;
        account.deposit_released_at.get_or_insert(now);
        account.final_released_at = Some(now);
        account.updated_at = now;
        let account = self.store.update_escrow_account(account).await?;

        self.audit_service
            .log_event(
                contract.contractor_id,
                "escrow_released",
                Some(account.id),
                Some(serde_json::json!({ "payout": payout.to_string() })),
                "Final payment released to contractor".to_string(),
            )
            .await?;
        Ok(account)
    }

    /// Freeze the account while a dispute is open. Calling this on an
    /// already-disputed account is a no-op: one hold entry, one state.
    pub async fn hold_in_dispute(&self, contract_id: Uuid) -> Result<EscrowAccount, ServiceError> {
        let mut account = self.load(contract_id).await?;
        if account.status == EscrowStatus::Disputed {
            return Ok(account);
        }
        Self::check_transition(&account, EscrowStatus::Disputed)?;

        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::DisputeHold,
            BigDecimal::from(0),
            None,
        ));
        account.status = EscrowStatus::Disputed;
        account.updated_at = Utc::now();
        let account = self.store.update_escrow_account(account).await?;

        tracing::info!(%contract_id, "escrow frozen for dispute");
        Ok(account)
    }

    /// Return everything under hold to the homeowner.
    pub async fn refund_to_homeowner(
        &self,
        contract: &Contract,
    ) -> Result<EscrowAccount, ServiceError> {
        let mut account = self.load(contract.id).await?;
        Self::check_transition(&account, EscrowStatus::Refunded)?;

        let held = account.held_amount();
        let charge_ref = account
            .entry_reference(EscrowEntryKind::DepositCharge)
            .unwrap_or_default()
            .to_string();
        let key = format!("{}:refund", contract.id);
        let refund_ref = self.gateway.refund(&charge_ref, &held, &key).await?;

        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::Refund,
            held.clone(),
            Some(refund_ref),
        ));
        account.status = EscrowStatus::Refunded;
        account.updated_at = Utc::now();
        let account = self.store.update_escrow_account(account).await?;

        self.audit_service
            .log_event(
                contract.homeowner_id,
                "escrow_refunded",
                Some(account.id),
                Some(serde_json::json!({ "amount": held.to_string() })),
                "Held funds refunded to homeowner".to_string(),
            )
            .await?;
        Ok(account)
    }

    /// Split the held amount between the parties. The two figures must sum
    /// exactly to what is under hold; anything else is rejected before any
    /// persistence or fund movement.
    pub async fn partial_refund(
        &self,
        contract: &Contract,
        contractor_payout: BigDecimal,
        homeowner_refund: BigDecimal,
    ) -> Result<EscrowAccount, ServiceError> {
        let mut account = self.load(contract.id).await?;
        Self::check_transition(&account, EscrowStatus::PartialRefund)?;

        let held = account.held_amount();
        if &contractor_payout + &homeowner_refund != held {
            return Err(ServiceError::Validation(format!(
                "partial refund split {contractor_payout} + {homeowner_refund} does not equal held amount {held}"
            )));
        }
        if contractor_payout < BigDecimal::from(0) || homeowner_refund < BigDecimal::from(0) {
            return Err(ServiceError::Validation(
                "partial refund amounts must be non-negative".to_string(),
            ));
        }

        let payout_key = format!("{}:partial_payout", contract.id);
        let transfer_ref = self
            .gateway
            .transfer(&contractor_payout, &contract.contractor_id.to_string(), &payout_key)
            .await?;

        let charge_ref = account
            .entry_reference(EscrowEntryKind::DepositCharge)
            .unwrap_or_default()
            .to_string();
        let refund_key = format!("{}:partial_refund", contract.id);
        let refund_ref = self
            .gateway
            .refund(&charge_ref, &homeowner_refund, &refund_key)
            .await?;

        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::PartialPayout,
            contractor_payout.clone(),
            Some(transfer_ref),
        ));
        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::PartialRefund,
            homeowner_refund.clone(),
            Some(refund_ref),
        ));
        account.status = EscrowStatus::PartialRefund;
        account.updated_at = Utc::now();
        let account = self.store.update_escrow_account(account).await?;

        self.audit_service
            .log_event(
                contract.homeowner_id,
                "escrow_partial_refund",
                Some(account.id),
                Some(serde_json::json!({
                    "contractor_payout": contractor_payout.to_string(),
                    "homeowner_refund": homeowner_refund.to_string(),
                })),
                "Held funds split between contractor and homeowner".to_string(),
            )
            .await?;
        Ok(account)
    }

    /// Park the funds while the contractor reworks. A deadline is attached;
    /// acting on its expiry is the external scheduler's job.
    pub async fn hold_for_rework(
        &self,
        contract_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<EscrowAccount, ServiceError> {
        let mut account = self.load(contract_id).await?;
        Self::check_transition(&account, EscrowStatus::HeldForRework)?;

        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::ReworkHold,
            BigDecimal::from(0),
            None,
        ));
        account.status = EscrowStatus::HeldForRework;
        account.rework_deadline = Some(now + Duration::days(self.config.rework_window_days));
        account.updated_at = Utc::now();
        Ok(self.store.update_escrow_account(account).await?)
    }

    pub async fn hold_for_arbitration(
        &self,
        contract_id: Uuid,
    ) -> Result<EscrowAccount, ServiceError> {
        let mut account = self.load(contract_id).await?;
        Self::check_transition(&account, EscrowStatus::HeldForArbitration)?;

        account.transactions.push(EscrowEntry::new(
            EscrowEntryKind::ArbitrationHold,
            BigDecimal::from(0),
            None,
        ));
        account.status = EscrowStatus::HeldForArbitration;
        account.updated_at = Utc::now();
        Ok(self.store.update_escrow_account(account).await?)
    }

    /// Scheduler callback: refund an account whose rework deadline has
    /// lapsed. Returns None when the deadline has not passed (or the account
    /// left the rework state in the meantime).
    pub async fn expire_rework(
        &self,
        contract: &Contract,
        now: DateTime<Utc>,
    ) -> Result<Option<EscrowAccount>, ServiceError> {
        let account = self.load(contract.id).await?;
        if account.status != EscrowStatus::HeldForRework {
            return Ok(None);
        }
        match account.rework_deadline {
            Some(deadline) if now > deadline => {
                let refunded = self.refund_to_homeowner(contract).await?;
                Ok(Some(refunded))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::payment_provider::SandboxGateway;
    use crate::utils::currency::money;
    use crate::models::contractmodel::ContractStatus;

    fn contract() -> Contract {
        Contract {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            bid_id: Uuid::new_v4(),
            homeowner_id: Uuid::new_v4(),
            contractor_id: Uuid::new_v4(),
            amount: money("500.00"),
            deposit_amount: money("125.00"),
            final_amount: money("375.00"),
            platform_fee: money("18.75"),
            contractor_net: money("481.25"),
            status: ContractStatus::Active,
            accepted_at: Utc::now(),
            completed_at: None,
            cancelled_at: None,
        }
    }

    fn service() -> (EscrowService, Arc<SandboxGateway>) {
        let gateway = Arc::new(SandboxGateway::new());
        let service = EscrowService::new(
            Arc::new(StoreClient::new()),
            gateway.clone(),
            Arc::new(AuditService::new()),
            Arc::new(Config::default()),
        );
        (service, gateway)
    }

    async fn funded_account(service: &EscrowService, contract: &Contract) {
        service.create_escrow(contract, "ch_dep".to_string()).await.unwrap();
        service.charge_remaining_balance(contract).await.unwrap();
    }

    #[tokio::test]
    async fn release_appends_payout_and_fee_together() {
        let (service, _) = service();
        let contract = contract();
        funded_account(&service, &contract).await;

        let account = service.release_final_payment(&contract).await.unwrap();
        assert_eq!(account.status, EscrowStatus::Released);
        assert_eq!(account.replay_status(), EscrowStatus::Released);
        assert_eq!(account.held_amount(), money("0.00"));
        assert!(account.has_entry(EscrowEntryKind::FinalPayout));
        assert!(account.has_entry(EscrowEntryKind::PlatformFee));
        assert_eq!(account.outbound_total(), money("500.00"));
    }

    #[tokio::test]
    async fn hold_in_dispute_is_idempotent() {
        let (service, _) = service();
        let contract = contract();
        funded_account(&service, &contract).await;

        let first = service.hold_in_dispute(contract.id).await.unwrap();
        let second = service.hold_in_dispute(contract.id).await.unwrap();
        assert_eq!(second.status, EscrowStatus::Disputed);
        let holds = second
            .transactions
            .iter()
            .filter(|e| e.kind == EscrowEntryKind::DisputeHold)
            .count();
        assert_eq!(holds, 1);
        assert_eq!(first.transactions.len(), second.transactions.len());
    }

    #[tokio::test]
    async fn release_is_forbidden_while_disputed() {
        let (service, _) = service();
        let contract = contract();
        funded_account(&service, &contract).await;
        service.hold_in_dispute(contract.id).await.unwrap();

        let result = service.release_final_payment(&contract).await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidEscrowTransition(
                EscrowStatus::Disputed,
                EscrowStatus::Released
            ))
        ));
    }

    #[tokio::test]
    async fn partial_refund_must_sum_to_held_amount() {
        let (service, gateway) = service();
        let contract = contract();
        funded_account(&service, &contract).await;
        service.hold_in_dispute(contract.id).await.unwrap();
        let ops_before = gateway.operation_count();

        let bad = service
            .partial_refund(&contract, money("100.00"), money("100.00"))
            .await;
        assert!(matches!(bad, Err(ServiceError::Validation(_))));
        // Rejected before any fund movement.
        assert_eq!(gateway.operation_count(), ops_before);

        let account = service
            .partial_refund(&contract, money("250.00"), money("250.00"))
            .await
            .unwrap();
        assert_eq!(account.status, EscrowStatus::PartialRefund);
        assert_eq!(account.replay_status(), EscrowStatus::PartialRefund);
        assert_eq!(account.outbound_total(), money("500.00"));
    }

    #[tokio::test]
    async fn second_terminal_resolution_is_rejected() {
        let (service, _) = service();
        let contract = contract();
        funded_account(&service, &contract).await;
        service.hold_in_dispute(contract.id).await.unwrap();
        service.refund_to_homeowner(&contract).await.unwrap();

        let again = service.refund_to_homeowner(&contract).await;
        assert!(matches!(again, Err(ServiceError::EscrowAlreadyResolved(_))));
        let split = service
            .partial_refund(&contract, money("250.00"), money("250.00"))
            .await;
        assert!(matches!(split, Err(ServiceError::EscrowAlreadyResolved(_))));
    }

    #[tokio::test]
    async fn rework_expiry_refunds_after_deadline() {
        let (service, _) = service();
        let contract = contract();
        funded_account(&service, &contract).await;
        service.hold_in_dispute(contract.id).await.unwrap();
        let now = Utc::now();
        service.hold_for_rework(contract.id, now).await.unwrap();

        let early = service.expire_rework(&contract, now).await.unwrap();
        assert!(early.is_none());

        let late = now + Duration::days(8);
        let refunded = service.expire_rework(&contract, late).await.unwrap().unwrap();
        assert_eq!(refunded.status, EscrowStatus::Refunded);
        assert_eq!(refunded.replay_status(), EscrowStatus::Refunded);
    }

    #[tokio::test]
    async fn charge_remaining_balance_is_idempotent() {
        let (service, gateway) = service();
        let contract = contract();
        service.create_escrow(&contract, "ch_dep".to_string()).await.unwrap();

        let first = service.charge_remaining_balance(&contract).await.unwrap();
        assert_eq!(first.held_amount(), money("500.00"));
        let second = service.charge_remaining_balance(&contract).await.unwrap();
        assert_eq!(second.held_amount(), money("500.00"));
        assert_eq!(
            second
                .transactions
                .iter()
                .filter(|e| e.kind == EscrowEntryKind::FinalCharge)
                .count(),
            1
        );
        // Only the one gateway charge happened.
        assert_eq!(gateway.operation_count(), 1);
    }
}
