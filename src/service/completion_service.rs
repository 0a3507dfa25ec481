// service/completion_service.rs
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    dtos::lifecycledtos::{ReviewCompletionDto, SubmitCompletionDto},
    models::{
        completionmodel::{CompletionStatus, JobCompletion},
        contractmodel::ContractStatus,
        jobmodel::JobStatus,
    },
    service::{
        audit_service::AuditService, error::ServiceError, escrow_service::EscrowService,
        locks::LockRegistry, notification_service::NotificationService,
        rating_service::RatingService,
    },
    store::{
        completionstore::CompletionExt,
        contractstore::ContractExt,
        jobstore::JobExt,
        store::{StoreClient, StoreError},
    },
};

/// Completion Workflow: contractor submits evidence, the contract enters
/// review with a dispute window running, and the homeowner either approves
/// (final release, rating) or rejects (back to Active for resubmission).
#[derive(Debug, Clone)]
pub struct CompletionService {
    store: Arc<StoreClient>,
    escrow_service: Arc<EscrowService>,
    rating_service: Arc<RatingService>,
    notification_service: Arc<NotificationService>,
    audit_service: Arc<AuditService>,
    locks: LockRegistry,
    config: Arc<Config>,
}

impl CompletionService {
    pub fn new(
        store: Arc<StoreClient>,
        escrow_service: Arc<EscrowService>,
        rating_service: Arc<RatingService>,
        notification_service: Arc<NotificationService>,
        audit_service: Arc<AuditService>,
        locks: LockRegistry,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            escrow_service,
            rating_service,
            notification_service,
            audit_service,
            locks,
            config,
        }
    }

    pub async fn submit_completion(
        &self,
        contractor_id: Uuid,
        completion_data: SubmitCompletionDto,
    ) -> Result<JobCompletion, ServiceError> {
        completion_data.validate()?;

        let contract = self
            .store
            .get_contract_by_id(completion_data.contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(completion_data.contract_id))?;
        if contract.contractor_id != contractor_id {
            return Err(ServiceError::Unauthorized(contractor_id));
        }

        let completion = {
            let _guard = self.locks.acquire(contract.id).await;

            let mut contract = self
                .store
                .get_contract_by_id(contract.id)
                .await?
                .ok_or(ServiceError::ContractNotFound(contract.id))?;
            if contract.status != ContractStatus::Active {
                return Err(ServiceError::ContractNotActive(contract.id, contract.status));
            }

            // Fund the remaining balance before anything is recorded: a
            // declined final-leg charge leaves the contract Active and no
            // completion behind, so the contractor can simply resubmit.
            // Funding up front also means a dispute raised during review
            // holds the full amount.
            self.escrow_service.charge_remaining_balance(&contract).await?;

            let now = Utc::now();
            let completion = JobCompletion {
                id: Uuid::new_v4(),
                contract_id: contract.id,
                photos: completion_data.photos,
                videos: completion_data.videos,
                notes: completion_data.notes,
                geolocation: completion_data.geolocation,
                status: CompletionStatus::Submitted,
                dispute_window_expiry: now + Duration::days(self.config.dispute_window_days),
                rating: None,
                feedback: None,
                submitted_at: now,
                reviewed_at: None,
            };
            let completion = match self.store.insert_completion(completion).await {
                Ok(completion) => completion,
                Err(StoreError::Conflict(msg)) => return Err(ServiceError::Validation(msg)),
                Err(e) => return Err(e.into()),
            };

            contract.status = ContractStatus::PendingApproval;
            self.store.update_contract(contract).await?;
            completion
        };

        if let Err(err) = self
            .notification_service
            .notify_completion_submitted(contract.homeowner_id, completion.id)
            .await
        {
            tracing::warn!("completion notification failed: {err}");
        }
        self.audit_service
            .log_event(
                contractor_id,
                "completion_submitted",
                Some(completion.id),
                Some(serde_json::json!({
                    "contract_id": contract.id,
                    "photos": completion.photos.len(),
                    "dispute_window_expiry": completion.dispute_window_expiry,
                })),
                "Work evidence submitted for review".to_string(),
            )
            .await?;

        tracing::info!(completion_id = %completion.id, contract_id = %contract.id, "completion submitted");
        Ok(completion)
    }

    pub async fn review_completion(
        &self,
        completion_id: Uuid,
        homeowner_id: Uuid,
        review: ReviewCompletionDto,
    ) -> Result<JobCompletion, ServiceError> {
        review.validate()?;

        let completion = self
            .store
            .get_completion_by_id(completion_id)
            .await?
            .ok_or(ServiceError::CompletionNotFound(completion_id))?;
        let contract = self
            .store
            .get_contract_by_id(completion.contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(completion.contract_id))?;

        if contract.homeowner_id != homeowner_id {
            return Err(ServiceError::Unauthorized(homeowner_id));
        }
        // A party cannot sit on both sides of the review.
        if contract.contractor_id == homeowner_id {
            return Err(ServiceError::Unauthorized(homeowner_id));
        }

        let (completion, contract) = {
            let _guard = self.locks.acquire(contract.id).await;

            let mut completion = self
                .store
                .get_completion_by_id(completion_id)
                .await?
                .ok_or(ServiceError::CompletionNotFound(completion_id))?;
            if completion.status != CompletionStatus::Submitted {
                return Err(ServiceError::CompletionNotPending(
                    completion.id,
                    completion.status,
                ));
            }
            let mut contract = self
                .store
                .get_contract_by_id(completion.contract_id)
                .await?
                .ok_or(ServiceError::ContractNotFound(completion.contract_id))?;

            let now = Utc::now();
            if review.approved {
                // Move the money first. A declined payout returns here with
                // the completion still Submitted and the contract still
                // PendingApproval, so the review can be retried once the
                // gateway recovers.
                self.escrow_service.release_final_payment(&contract).await?;
                completion.status = CompletionStatus::Approved;
                contract.status = ContractStatus::Completed;
                contract.completed_at = Some(now);
            } else {
                completion.status = CompletionStatus::Rejected;
                contract.status = ContractStatus::Active;
            }
            completion.rating = review.rating;
            completion.feedback = review.feedback.clone();
            completion.reviewed_at = Some(now);

            let completion = self.store.update_completion(completion).await?;
            let contract = self.store.update_contract(contract).await?;
            (completion, contract)
        };

        if review.approved {
            self.store
                .update_job_status(contract.job_id, JobStatus::Completed)
                .await?;

            // Funds are already released; a rating bookkeeping failure must
            // not fail the review.
            if let Some(rating) = completion.rating {
                if let Err(err) = self
                    .rating_service
                    .record_review(
                        contract.id,
                        contract.contractor_id,
                        homeowner_id,
                        rating,
                        completion.feedback.clone(),
                    )
                    .await
                {
                    tracing::warn!("rating update failed: {err}");
                }
            }
        }

        if let Err(err) = self
            .notification_service
            .notify_completion_reviewed(contract.contractor_id, completion.id, review.approved)
            .await
        {
            tracing::warn!("review notification failed: {err}");
        }
        self.audit_service
            .log_event(
                homeowner_id,
                if review.approved {
                    "completion_approved"
                } else {
                    "completion_rejected"
                },
                Some(completion.id),
                Some(serde_json::json!({
                    "contract_id": contract.id,
                    "rating": completion.rating,
                })),
                "Completion reviewed by homeowner".to_string(),
            )
            .await?;

        Ok(completion)
    }
}
