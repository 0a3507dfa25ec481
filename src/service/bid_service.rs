// service/bid_service.rs
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    dtos::lifecycledtos::SubmitBidDto,
    models::{
        bidmodel::{Bid, BidStatus, ViewerContext},
        jobmodel::UserRole,
    },
    service::{error::ServiceError, notification_service::NotificationService},
    store::{
        bidstore::BidExt, jobstore::JobExt, reviewstore::ReviewExt, store::StoreClient,
        store::StoreError,
    },
    utils::currency::round_money,
};

/// Bid Ledger: one bid per contractor per job, blind visibility, withdrawal
/// while still open.
#[derive(Debug, Clone)]
pub struct BidService {
    store: Arc<StoreClient>,
    notification_service: Arc<NotificationService>,
    config: Arc<Config>,
}

impl BidService {
    pub fn new(
        store: Arc<StoreClient>,
        notification_service: Arc<NotificationService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            notification_service,
            config,
        }
    }

    pub async fn submit_bid(
        &self,
        contractor_id: Uuid,
        bid_data: SubmitBidDto,
    ) -> Result<Bid, ServiceError> {
        bid_data.validate()?;

        let amount = BigDecimal::try_from(bid_data.amount)
            .map_err(|_| ServiceError::Validation("Invalid bid amount".to_string()))?;
        let amount = round_money(&amount);
        if amount < self.config.minimum_bid_amount {
            return Err(ServiceError::AmountBelowMinimum(
                amount.to_string(),
                self.config.minimum_bid_amount.to_string(),
            ));
        }

        let job = self
            .store
            .get_job_by_id(bid_data.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(bid_data.job_id))?;
        if !job.is_accepting_bids() {
            return Err(ServiceError::JobNotOpen(job.id));
        }

        if self
            .store
            .get_bid_by_job_and_contractor(job.id, contractor_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateBid(contractor_id, job.id));
        }

        // Rating captured now, on purpose: the bid card keeps showing what
        // the contractor's rating was when they bid.
        let rating_snapshot = self
            .store
            .get_contractor_profile(contractor_id)
            .await?
            .and_then(|p| p.rating);

        let now = Utc::now();
        let bid = Bid {
            id: Uuid::new_v4(),
            job_id: job.id,
            contractor_id,
            amount,
            timeline_days: bid_data.timeline_days,
            proposal: bid_data.proposal,
            contractor_rating_snapshot: rating_snapshot,
            status: BidStatus::Submitted,
            created_at: now,
            updated_at: now,
        };

        let bid = match self.store.insert_bid(bid).await {
            Ok(bid) => bid,
            Err(StoreError::Conflict(_)) => {
                return Err(ServiceError::DuplicateBid(contractor_id, job.id))
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(bid_id = %bid.id, job_id = %job.id, "bid submitted");
        if let Err(err) = self
            .notification_service
            .notify_bid_submitted(job.homeowner_id, job.id, bid.id)
            .await
        {
            tracing::warn!("bid notification failed: {err}");
        }

        Ok(bid)
    }

    /// Blind bidding: the job owner and arbiters see everything, a bidder
    /// sees only their own bid, anyone else gets an authorization error
    /// rather than an empty list.
    pub async fn list_visible_bids(
        &self,
        job_id: Uuid,
        viewer_id: Uuid,
        viewer_role: UserRole,
    ) -> Result<Vec<Bid>, ServiceError> {
        let job = self
            .store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let own_bid = self
            .store
            .get_bid_by_job_and_contractor(job_id, viewer_id)
            .await?;
        let viewer = ViewerContext::resolve(&job, viewer_id, viewer_role, own_bid.is_some());

        match viewer {
            ViewerContext::JobOwner | ViewerContext::Arbiter => {
                Ok(self.store.get_bids_for_job(job_id).await?)
            }
            ViewerContext::Bidder(_) => Ok(own_bid.into_iter().collect()),
            ViewerContext::Other => Err(ServiceError::BlindBiddingViolation(viewer_id, job_id)),
        }
    }

    pub async fn withdraw_bid(&self, bid_id: Uuid, contractor_id: Uuid) -> Result<Bid, ServiceError> {
        let bid = self
            .store
            .get_bid_by_id(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        if bid.contractor_id != contractor_id {
            return Err(ServiceError::Unauthorized(contractor_id));
        }
        if bid.status != BidStatus::Submitted {
            return Err(ServiceError::BidNoLongerAvailable(bid.id, bid.status));
        }

        let bid = self.store.update_bid_status(bid.id, BidStatus::Withdrawn).await?;
        tracing::info!(bid_id = %bid.id, "bid withdrawn");
        Ok(bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::jobmodel::Job;

    fn dto(job_id: Uuid, amount: f64) -> SubmitBidDto {
        SubmitBidDto {
            job_id,
            amount,
            timeline_days: 14,
            proposal: "Full repaint of the exterior including prep work".to_string(),
        }
    }

    async fn service_with_job() -> (BidService, Job) {
        let store = Arc::new(StoreClient::new());
        let job = store
            .insert_job(Job::new(
                Uuid::new_v4(),
                "Exterior paint".to_string(),
                "Two-storey house".to_string(),
            ))
            .await
            .unwrap();
        let service = BidService::new(
            store,
            Arc::new(NotificationService::new()),
            Arc::new(Config::default()),
        );
        (service, job)
    }

    #[tokio::test]
    async fn second_bid_by_same_contractor_conflicts() {
        let (service, job) = service_with_job().await;
        let contractor = Uuid::new_v4();
        service.submit_bid(contractor, dto(job.id, 500.0)).await.unwrap();
        let result = service.submit_bid(contractor, dto(job.id, 450.0)).await;
        assert!(matches!(result, Err(ServiceError::DuplicateBid(_, _))));
    }

    #[tokio::test]
    async fn bid_below_minimum_is_rejected() {
        let (service, job) = service_with_job().await;
        let result = service.submit_bid(Uuid::new_v4(), dto(job.id, 10.0)).await;
        assert!(matches!(result, Err(ServiceError::AmountBelowMinimum(_, _))));
    }

    #[tokio::test]
    async fn blind_bidding_visibility() {
        let (service, job) = service_with_job().await;
        let contractor_a = Uuid::new_v4();
        let contractor_b = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        service.submit_bid(contractor_a, dto(job.id, 500.0)).await.unwrap();
        service.submit_bid(contractor_b, dto(job.id, 600.0)).await.unwrap();

        let owner_view = service
            .list_visible_bids(job.id, job.homeowner_id, UserRole::Homeowner)
            .await
            .unwrap();
        assert_eq!(owner_view.len(), 2);

        let a_view = service
            .list_visible_bids(job.id, contractor_a, UserRole::Contractor)
            .await
            .unwrap();
        assert_eq!(a_view.len(), 1);
        assert_eq!(a_view[0].contractor_id, contractor_a);

        let arbiter_view = service
            .list_visible_bids(job.id, Uuid::new_v4(), UserRole::Arbiter)
            .await
            .unwrap();
        assert_eq!(arbiter_view.len(), 2);

        let outsider_view = service
            .list_visible_bids(job.id, outsider, UserRole::Contractor)
            .await;
        assert!(matches!(
            outsider_view,
            Err(ServiceError::BlindBiddingViolation(_, _))
        ));
    }

    #[tokio::test]
    async fn owner_sees_empty_list_on_fresh_job() {
        let (service, job) = service_with_job().await;
        let owner_view = service
            .list_visible_bids(job.id, job.homeowner_id, UserRole::Homeowner)
            .await
            .unwrap();
        assert!(owner_view.is_empty());
    }

    #[tokio::test]
    async fn withdraw_requires_owner_and_open_status() {
        let (service, job) = service_with_job().await;
        let contractor = Uuid::new_v4();
        let bid = service.submit_bid(contractor, dto(job.id, 500.0)).await.unwrap();

        let stranger = service.withdraw_bid(bid.id, Uuid::new_v4()).await;
        assert!(matches!(stranger, Err(ServiceError::Unauthorized(_))));

        let withdrawn = service.withdraw_bid(bid.id, contractor).await.unwrap();
        assert_eq!(withdrawn.status, BidStatus::Withdrawn);

        let again = service.withdraw_bid(bid.id, contractor).await;
        assert!(matches!(again, Err(ServiceError::BidNoLongerAvailable(_, _))));
    }
}
