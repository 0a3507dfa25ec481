// service/contract_service.rs
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    dtos::lifecycledtos::CreateChangeOrderDto,
    models::{
        bidmodel::BidStatus,
        contractmodel::{ChangeOrder, ChangeOrderStatus, Contract, ContractStatus},
    },
    service::{
        audit_service::AuditService, error::ServiceError, escrow_service::EscrowService,
        locks::LockRegistry, notification_service::NotificationService,
        payment_provider::PaymentGateway,
    },
    store::{
        bidstore::BidExt,
        contractstore::ContractExt,
        jobstore::JobExt,
        store::{StoreClient, StoreError},
    },
    utils::currency::{fraction_of, round_money},
};

/// Contract Formation: turns exactly one accepted bid into a contract,
/// computing the deposit/final split and the platform fee, and rejecting
/// every competing bid in the same atomic step. Also owns change orders.
#[derive(Debug, Clone)]
pub struct ContractService {
    store: Arc<StoreClient>,
    escrow_service: Arc<EscrowService>,
    gateway: Arc<dyn PaymentGateway>,
    notification_service: Arc<NotificationService>,
    audit_service: Arc<AuditService>,
    locks: LockRegistry,
    config: Arc<Config>,
}

/// Fee arithmetic in one place: deposit is a configured fraction of the
/// amount, the platform fee is levied on the deposit leg, and the final leg
/// is whatever keeps `deposit + final == amount` exact.
fn derive_split(contract: &mut Contract, config: &Config) {
    contract.amount = round_money(&contract.amount);
    contract.deposit_amount = fraction_of(&contract.amount, &config.deposit_fraction);
    contract.final_amount = &contract.amount - &contract.deposit_amount;
    contract.platform_fee = fraction_of(&contract.deposit_amount, &config.platform_fee_fraction);
    contract.contractor_net = &contract.amount - &contract.platform_fee;
}

impl ContractService {
    pub fn new(
        store: Arc<StoreClient>,
        escrow_service: Arc<EscrowService>,
        gateway: Arc<dyn PaymentGateway>,
        notification_service: Arc<NotificationService>,
        audit_service: Arc<AuditService>,
        locks: LockRegistry,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            escrow_service,
            gateway,
            notification_service,
            audit_service,
            locks,
            config,
        }
    }

    pub async fn accept_bid(
        &self,
        bid_id: Uuid,
        homeowner_id: Uuid,
    ) -> Result<Contract, ServiceError> {
        let bid = self
            .store
            .get_bid_by_id(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;
        let job = self
            .store
            .get_job_by_id(bid.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(bid.job_id))?;

        if job.homeowner_id != homeowner_id {
            return Err(ServiceError::Unauthorized(homeowner_id));
        }

        // Pre-flight under the job lock, then release it for the charge.
        {
            let _guard = self.locks.acquire(job.id).await;
            if self.store.get_contract_by_job_id(job.id).await?.is_some() {
                return Err(ServiceError::JobAlreadyAwarded(job.id));
            }
            let current = self
                .store
                .get_bid_by_id(bid_id)
                .await?
                .ok_or(ServiceError::BidNotFound(bid_id))?;
            if current.status != BidStatus::Submitted {
                return Err(ServiceError::BidNoLongerAvailable(bid_id, current.status));
            }
        }

        let mut contract = Contract {
            id: Uuid::new_v4(),
            job_id: job.id,
            bid_id: bid.id,
            homeowner_id,
            contractor_id: bid.contractor_id,
            amount: bid.amount.clone(),
            deposit_amount: BigDecimal::from(0),
            final_amount: BigDecimal::from(0),
            platform_fee: BigDecimal::from(0),
            contractor_net: BigDecimal::from(0),
            status: ContractStatus::Active,
            accepted_at: Utc::now(),
            completed_at: None,
            cancelled_at: None,
        };
        derive_split(&mut contract, &self.config);

        // Deposit charge happens outside the lock. The key names both the
        // job and the bid: a retried acceptance of the same bid reuses the
        // charge, while accepting a different bid (different amount) gets
        // its own.
        let deposit_key = format!("{}:{}:deposit", job.id, bid.id);
        let charge_ref = self
            .gateway
            .charge(
                &contract.deposit_amount,
                &homeowner_id.to_string(),
                &deposit_key,
            )
            .await?;
        let deposit_amount = contract.deposit_amount.clone();

        // Re-acquire and let the store re-validate inside the atomic
        // cascade: accepted bid flipped, siblings rejected, contract
        // inserted, all or nothing.
        let _guard = self.locks.acquire(job.id).await;
        let (contract, rejected) = match self
            .store
            .accept_bid_and_reject_siblings(contract)
            .await
        {
            Ok(result) => result,
            Err(StoreError::Conflict(msg)) => {
                // The acceptance lost the race, so the deposit that was
                // just taken has no contract behind it. Reverse it; if the
                // reversal also fails the idempotency key lets support
                // replay it.
                let reversal_key = format!("{}:{}:deposit_reversal", job.id, bid.id);
                if let Err(err) = self
                    .gateway
                    .refund(&charge_ref, &deposit_amount, &reversal_key)
                    .await
                {
                    tracing::warn!(
                        job_id = %job.id,
                        bid_id = %bid.id,
                        "deposit reversal failed after conflicted acceptance: {err}"
                    );
                }
                if msg.contains("contract") {
                    return Err(ServiceError::JobAlreadyAwarded(job.id));
                }
                let current = self
                    .store
                    .get_bid_by_id(bid_id)
                    .await?
                    .ok_or(ServiceError::BidNotFound(bid_id))?;
                return Err(ServiceError::BidNoLongerAvailable(bid_id, current.status));
            }
            Err(e) => return Err(e.into()),
        };

        self.escrow_service.create_escrow(&contract, charge_ref).await?;

        self.audit_service
            .log_event(
                homeowner_id,
                "bid_accepted",
                Some(contract.id),
                Some(serde_json::json!({
                    "bid_id": bid.id,
                    "amount": contract.amount.to_string(),
                    "deposit": contract.deposit_amount.to_string(),
                    "rejected_bids": rejected.len(),
                })),
                "Bid accepted into contract; competing bids rejected".to_string(),
            )
            .await?;

        if let Err(err) = self
            .notification_service
            .notify_bid_decided(contract.contractor_id, bid.id, true)
            .await
        {
            tracing::warn!("acceptance notification failed: {err}");
        }
        for rejected_id in &rejected {
            if let Ok(Some(sibling)) = self.store.get_bid_by_id(*rejected_id).await {
                if let Err(err) = self
                    .notification_service
                    .notify_bid_decided(sibling.contractor_id, sibling.id, false)
                    .await
                {
                    tracing::warn!("rejection notification failed: {err}");
                }
            }
        }

        tracing::info!(
            contract_id = %contract.id,
            job_id = %job.id,
            rejected = rejected.len(),
            "contract formed"
        );
        Ok(contract)
    }

    pub async fn create_change_order(
        &self,
        contract_id: Uuid,
        homeowner_id: Uuid,
        order_data: CreateChangeOrderDto,
    ) -> Result<ChangeOrder, ServiceError> {
        order_data.validate()?;

        let contract = self
            .store
            .get_contract_by_id(contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(contract_id))?;
        if contract.homeowner_id != homeowner_id {
            return Err(ServiceError::Unauthorized(homeowner_id));
        }
        if contract.status != ContractStatus::Active {
            return Err(ServiceError::ContractNotActive(contract.id, contract.status));
        }

        let amount = BigDecimal::try_from(order_data.amount)
            .map_err(|_| ServiceError::Validation("Invalid change order amount".to_string()))?;

        let order = self
            .store
            .insert_change_order(ChangeOrder {
                id: Uuid::new_v4(),
                contract_id,
                title: order_data.title,
                description: order_data.description,
                amount: round_money(&amount),
                status: ChangeOrderStatus::Pending,
                created_at: Utc::now(),
                decided_at: None,
            })
            .await?;

        tracing::info!(order_id = %order.id, %contract_id, "change order created");
        Ok(order)
    }

    /// Approve a change order: the delta is charged first, and only a
    /// successful charge re-derives the contract split and escrow totals. A
    /// failed charge marks the order PaymentFailed and leaves the contract
    /// and escrow untouched.
    pub async fn approve_change_order(
        &self,
        order_id: Uuid,
        homeowner_id: Uuid,
    ) -> Result<ChangeOrder, ServiceError> {
        let order = self
            .store
            .get_change_order_by_id(order_id)
            .await?
            .ok_or(ServiceError::ChangeOrderNotFound(order_id))?;
        let contract = self
            .store
            .get_contract_by_id(order.contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(order.contract_id))?;

        if contract.homeowner_id != homeowner_id {
            return Err(ServiceError::Unauthorized(homeowner_id));
        }

        let _guard = self.locks.acquire(contract.id).await;

        let order = self
            .store
            .get_change_order_by_id(order_id)
            .await?
            .ok_or(ServiceError::ChangeOrderNotFound(order_id))?;
        if order.status != ChangeOrderStatus::Pending {
            return Err(ServiceError::Validation(format!(
                "change order is not pending (status {:?})",
                order.status
            )));
        }
        let mut contract = self
            .store
            .get_contract_by_id(order.contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(order.contract_id))?;
        if contract.status != ContractStatus::Active {
            return Err(ServiceError::ContractNotActive(contract.id, contract.status));
        }

        let charge_key = format!("{}:change_order:{}", contract.id, order.id);
        let charge_ref = match self
            .gateway
            .charge(&order.amount, &homeowner_id.to_string(), &charge_key)
            .await
        {
            Ok(reference) => reference,
            Err(err) => {
                let mut failed = order.clone();
                failed.status = ChangeOrderStatus::PaymentFailed;
                failed.decided_at = Some(Utc::now());
                self.store.update_change_order(failed).await?;
                tracing::warn!(order_id = %order.id, "change order charge failed: {err}");
                return Err(err.into());
            }
        };

        contract.amount = round_money(&(&contract.amount + &order.amount));
        derive_split(&mut contract, &self.config);
        let contract = self.store.update_contract(contract).await?;
        self.escrow_service
            .apply_change_order(&contract, &order.amount, charge_ref)
            .await?;

        let mut approved = order;
        approved.status = ChangeOrderStatus::Approved;
        approved.decided_at = Some(Utc::now());
        let approved = self.store.update_change_order(approved).await?;

        self.audit_service
            .log_event(
                homeowner_id,
                "change_order_approved",
                Some(contract.id),
                Some(serde_json::json!({
                    "order_id": approved.id,
                    "delta": approved.amount.to_string(),
                    "new_amount": contract.amount.to_string(),
                })),
                "Change order approved and delta charged".to_string(),
            )
            .await?;
        Ok(approved)
    }

    pub async fn reject_change_order(
        &self,
        order_id: Uuid,
        homeowner_id: Uuid,
    ) -> Result<ChangeOrder, ServiceError> {
        let order = self
            .store
            .get_change_order_by_id(order_id)
            .await?
            .ok_or(ServiceError::ChangeOrderNotFound(order_id))?;
        let contract = self
            .store
            .get_contract_by_id(order.contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(order.contract_id))?;
        if contract.homeowner_id != homeowner_id {
            return Err(ServiceError::Unauthorized(homeowner_id));
        }
        if order.status != ChangeOrderStatus::Pending {
            return Err(ServiceError::Validation(format!(
                "change order is not pending (status {:?})",
                order.status
            )));
        }

        let mut rejected = order;
        rejected.status = ChangeOrderStatus::Rejected;
        rejected.decided_at = Some(Utc::now());
        Ok(self.store.update_change_order(rejected).await?)
    }
}
