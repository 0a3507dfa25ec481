// service/dispute_service.rs
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    dtos::lifecycledtos::{DisputeResponseDto, InitiateDisputeDto, ResolveDisputeDto},
    models::{
        completionmodel::CompletionStatus,
        contractmodel::ContractStatus,
        disputemodel::{
            Dispute, DisputeMessage, DisputeStatus, ResolutionPath, SYSTEM_MEDIATOR,
        },
        jobmodel::{JobStatus, UserRole},
    },
    service::{
        audit_service::AuditService, error::ServiceError, escrow_service::EscrowService,
        locks::LockRegistry, notification_service::NotificationService,
    },
    store::{
        completionstore::CompletionExt, contractstore::ContractExt, disputestore::DisputeExt,
        escrowstore::EscrowExt, jobstore::JobExt, store::StoreClient,
    },
    utils::currency::percentage_of,
};

/// Dispute Mediation: the contested-funds sub-state-machine. A homeowner
/// opens a dispute against an unapproved completion, the contractor responds
/// within the mediation window, and a mediator (or the platform) resolves it
/// by dispatching exactly one fund movement to the Escrow Ledger.
#[derive(Debug, Clone)]
pub struct DisputeService {
    store: Arc<StoreClient>,
    escrow_service: Arc<EscrowService>,
    notification_service: Arc<NotificationService>,
    audit_service: Arc<AuditService>,
    locks: LockRegistry,
    config: Arc<Config>,
}

impl DisputeService {
    pub fn new(
        store: Arc<StoreClient>,
        escrow_service: Arc<EscrowService>,
        notification_service: Arc<NotificationService>,
        audit_service: Arc<AuditService>,
        locks: LockRegistry,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            escrow_service,
            notification_service,
            audit_service,
            locks,
            config,
        }
    }

    pub async fn initiate_dispute(
        &self,
        homeowner_id: Uuid,
        dispute_data: InitiateDisputeDto,
    ) -> Result<Dispute, ServiceError> {
        dispute_data.validate()?;

        let completion = self
            .store
            .get_completion_by_id(dispute_data.completion_id)
            .await?
            .ok_or(ServiceError::CompletionNotFound(dispute_data.completion_id))?;
        let contract = self
            .store
            .get_contract_by_id(completion.contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(completion.contract_id))?;

        if contract.homeowner_id != homeowner_id {
            return Err(ServiceError::Unauthorized(homeowner_id));
        }

        let dispute = {
            let _guard = self.locks.acquire(contract.id).await;

            let mut completion = self
                .store
                .get_completion_by_id(completion.id)
                .await?
                .ok_or(ServiceError::CompletionNotFound(completion.id))?;
            // Only an unapproved completion can be contested.
            if !matches!(
                completion.status,
                CompletionStatus::Submitted | CompletionStatus::Rejected
            ) {
                return Err(ServiceError::CompletionNotPending(
                    completion.id,
                    completion.status,
                ));
            }

            // Freeze the funds first; if the escrow cannot enter Disputed,
            // no dispute record or completion change is left behind.
            self.escrow_service.hold_in_dispute(contract.id).await?;

            let now = Utc::now();
            let dispute = self
                .store
                .insert_dispute(Dispute {
                    id: Uuid::new_v4(),
                    completion_id: completion.id,
                    contract_id: contract.id,
                    homeowner_id,
                    contractor_id: contract.contractor_id,
                    reason: dispute_data.reason,
                    description: dispute_data.description,
                    evidence_urls: dispute_data.evidence_urls,
                    status: DisputeStatus::Pending,
                    mediation_deadline: now
                        + Duration::hours(self.config.mediation_window_hours),
                    messages: Vec::new(),
                    resolution_path: None,
                    resolution_reasoning: None,
                    resolved_by: None,
                    created_at: now,
                    resolved_at: None,
                })
                .await?;

            completion.status = CompletionStatus::Disputed;
            self.store.update_completion(completion).await?;
            dispute
        };

        if let Err(err) = self
            .notification_service
            .notify_dispute_opened(contract.contractor_id, dispute.id, dispute.mediation_deadline)
            .await
        {
            tracing::warn!("dispute notification failed: {err}");
        }
        self.audit_service
            .log_event(
                homeowner_id,
                "dispute_initiated",
                Some(dispute.id),
                Some(serde_json::json!({
                    "contract_id": contract.id,
                    "completion_id": dispute.completion_id,
                    "reason": dispute.reason,
                })),
                "Dispute opened; escrow frozen".to_string(),
            )
            .await?;

        tracing::info!(dispute_id = %dispute.id, contract_id = %contract.id, "dispute initiated");
        Ok(dispute)
    }

    /// Contractor's formal response. Moves the dispute into mediation;
    /// rejected once the mediation deadline has lapsed.
    pub async fn submit_dispute_response(
        &self,
        dispute_id: Uuid,
        contractor_id: Uuid,
        response: DisputeResponseDto,
    ) -> Result<Dispute, ServiceError> {
        response.validate()?;

        let dispute = self
            .store
            .get_dispute_by_id(dispute_id)
            .await?
            .ok_or(ServiceError::DisputeNotFound(dispute_id))?;
        if dispute.contractor_id != contractor_id {
            return Err(ServiceError::Unauthorized(contractor_id));
        }

        let _guard = self.locks.acquire(dispute.contract_id).await;
        let mut dispute = self
            .store
            .get_dispute_by_id(dispute_id)
            .await?
            .ok_or(ServiceError::DisputeNotFound(dispute_id))?;
        if dispute.status != DisputeStatus::Pending {
            return Err(ServiceError::InvalidDisputeStatus(dispute.id, dispute.status));
        }
        if dispute.is_mediation_deadline_passed(Utc::now()) {
            return Err(ServiceError::MediationDeadlinePassed(dispute.id));
        }

        dispute.messages.push(DisputeMessage {
            id: Uuid::new_v4(),
            sender_id: contractor_id,
            body: response.message,
            sent_at: Utc::now(),
        });
        dispute.evidence_urls.extend(response.evidence_urls);
        dispute.status = DisputeStatus::Mediation;
        let dispute = self.store.update_dispute(dispute).await?;

        if let Err(err) = self
            .notification_service
            .notify(
                dispute.homeowner_id,
                "dispute_response",
                Some(dispute.id),
                None,
                "The contractor has responded to your dispute".to_string(),
            )
            .await
        {
            tracing::warn!("dispute response notification failed: {err}");
        }
        Ok(dispute)
    }

    /// Free-form mediation traffic from either party while the dispute is
    /// open.
    pub async fn add_message(
        &self,
        dispute_id: Uuid,
        sender_id: Uuid,
        body: String,
    ) -> Result<Dispute, ServiceError> {
        if body.trim().is_empty() {
            return Err(ServiceError::Validation("message may not be empty".to_string()));
        }

        let _guard = {
            let dispute = self
                .store
                .get_dispute_by_id(dispute_id)
                .await?
                .ok_or(ServiceError::DisputeNotFound(dispute_id))?;
            self.locks.acquire(dispute.contract_id).await
        };

        let mut dispute = self
            .store
            .get_dispute_by_id(dispute_id)
            .await?
            .ok_or(ServiceError::DisputeNotFound(dispute_id))?;
        if !dispute.is_party(sender_id) {
            return Err(ServiceError::Unauthorized(sender_id));
        }
        if !dispute.is_open() {
            return Err(ServiceError::InvalidDisputeStatus(dispute.id, dispute.status));
        }

        dispute.messages.push(DisputeMessage {
            id: Uuid::new_v4(),
            sender_id,
            body,
            sent_at: Utc::now(),
        });
        Ok(self.store.update_dispute(dispute).await?)
    }

    /// Execute a resolution. Only a non-party arbiter may resolve; `None`
    /// is the platform itself (deadline automation) and records the system
    /// sentinel. The fund movement is dispatched before any status is
    /// persisted: an upstream failure returns with the dispute still open
    /// and every status untouched, so resolution can simply be retried.
    /// Exactly-once is kept by the Resolved check under the contract lock,
    /// backstopped by the escrow store's terminal guard.
    pub async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        mediator: Option<(Uuid, UserRole)>,
        resolution: ResolveDisputeDto,
    ) -> Result<Dispute, ServiceError> {
        resolution.validate()?;

        let dispute = self
            .store
            .get_dispute_by_id(dispute_id)
            .await?
            .ok_or(ServiceError::DisputeNotFound(dispute_id))?;
        if let Some((mediator_id, mediator_role)) = mediator {
            if mediator_role != UserRole::Arbiter || dispute.is_party(mediator_id) {
                return Err(ServiceError::Unauthorized(mediator_id));
            }
        }
        let contract = self
            .store
            .get_contract_by_id(dispute.contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(dispute.contract_id))?;

        let dispute = {
            let _guard = self.locks.acquire(contract.id).await;
            let mut dispute = self
                .store
                .get_dispute_by_id(dispute_id)
                .await?
                .ok_or(ServiceError::DisputeNotFound(dispute_id))?;
            if dispute.status == DisputeStatus::Resolved {
                return Err(ServiceError::DisputeAlreadyResolved(dispute.id));
            }
            let mut contract = self
                .store
                .get_contract_by_id(contract.id)
                .await?
                .ok_or(ServiceError::ContractNotFound(contract.id))?;

            let now = Utc::now();

            // Money first, bookkeeping second.
            match resolution.resolution_path {
                ResolutionPath::Refund => {
                    self.escrow_service.refund_to_homeowner(&contract).await?;
                }
                ResolutionPath::PartialRefund => {
                    let percentage = resolution.partial_refund_percentage.ok_or_else(|| {
                        ServiceError::Validation(
                            "partial refund requires a percentage".to_string(),
                        )
                    })?;
                    let account = self
                        .store
                        .get_escrow_by_contract_id(contract.id)
                        .await?
                        .ok_or(ServiceError::EscrowNotFound(contract.id))?;
                    let held = account.held_amount();
                    let homeowner_refund =
                        percentage_of(&held, percentage).map_err(ServiceError::Validation)?;
                    let contractor_payout = &held - &homeowner_refund;
                    self.escrow_service
                        .partial_refund(&contract, contractor_payout, homeowner_refund)
                        .await?;
                }
                ResolutionPath::Rework => {
                    self.escrow_service.hold_for_rework(contract.id, now).await?;
                }
                ResolutionPath::Arbitration => {
                    self.escrow_service.hold_for_arbitration(contract.id).await?;
                }
            }

            match resolution.resolution_path {
                ResolutionPath::Refund => {
                    contract.status = ContractStatus::Cancelled;
                    contract.cancelled_at = Some(now);
                    self.store.update_contract(contract.clone()).await?;
                    self.store
                        .update_job_status(contract.job_id, JobStatus::Cancelled)
                        .await?;
                }
                ResolutionPath::PartialRefund => {
                    contract.status = ContractStatus::Completed;
                    contract.completed_at = Some(now);
                    self.store.update_contract(contract.clone()).await?;
                    self.store
                        .update_job_status(contract.job_id, JobStatus::Completed)
                        .await?;
                }
                ResolutionPath::Rework => {
                    contract.status = ContractStatus::Active;
                    self.store.update_contract(contract.clone()).await?;
                }
                ResolutionPath::Arbitration => {}
            }

            dispute.status = DisputeStatus::Resolved;
            dispute.resolution_path = Some(resolution.resolution_path);
            dispute.resolution_reasoning = Some(resolution.reasoning);
            dispute.resolved_by = Some(mediator.map(|(id, _)| id).unwrap_or(SYSTEM_MEDIATOR));
            dispute.resolved_at = Some(now);
            self.store.update_dispute(dispute).await?
        };

        let path_name = format!("{:?}", resolution.resolution_path);
        for party in [dispute.homeowner_id, dispute.contractor_id] {
            if let Err(err) = self
                .notification_service
                .notify_dispute_resolved(party, dispute.id, &path_name)
                .await
            {
                tracing::warn!("resolution notification failed: {err}");
            }
        }
        self.audit_service
            .log_event(
                dispute.resolved_by.unwrap_or(SYSTEM_MEDIATOR),
                "dispute_resolved",
                Some(dispute.id),
                Some(serde_json::json!({
                    "contract_id": dispute.contract_id,
                    "path": path_name,
                })),
                "Dispute resolved and funds dispatched".to_string(),
            )
            .await?;

        tracing::info!(dispute_id = %dispute.id, path = %path_name, "dispute resolved");
        Ok(dispute)
    }

    /// Scheduler callback: escalate every open dispute whose mediation
    /// deadline has lapsed. Returns the disputes that were escalated.
    pub async fn escalate_expired(&self, now: DateTime<Utc>) -> Result<Vec<Dispute>, ServiceError> {
        let open = self.store.get_open_disputes().await?;
        let mut escalated = Vec::new();
        for dispute in open {
            if !dispute.is_mediation_deadline_passed(now) {
                continue;
            }
            let _guard = self.locks.acquire(dispute.contract_id).await;
            let mut current = match self.store.get_dispute_by_id(dispute.id).await? {
                Some(d) if d.is_open() => d,
                _ => continue,
            };
            current.status = DisputeStatus::Escalated;
            let current = self.store.update_dispute(current).await?;
            tracing::info!(dispute_id = %current.id, "dispute escalated past mediation deadline");
            escalated.push(current);
        }
        Ok(escalated)
    }
}
