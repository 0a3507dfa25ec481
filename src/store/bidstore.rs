// store/bidstore.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::store::{StoreClient, StoreError};
use crate::models::bidmodel::{Bid, BidStatus};

#[async_trait]
pub trait BidExt {
    /// Insert a bid, enforcing uniqueness on (job_id, contractor_id).
    async fn insert_bid(&self, bid: Bid) -> Result<Bid, StoreError>;

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError>;

    async fn get_bid_by_job_and_contractor(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<Option<Bid>, StoreError>;

    async fn get_bids_for_job(&self, job_id: Uuid) -> Result<Vec<Bid>, StoreError>;

    async fn update_bid_status(&self, bid_id: Uuid, status: BidStatus) -> Result<Bid, StoreError>;
}

#[async_trait]
impl BidExt for StoreClient {
    async fn insert_bid(&self, bid: Bid) -> Result<Bid, StoreError> {
        let mut bids = self.bids.write().await;
        let duplicate = bids.values().any(|b| {
            b.job_id == bid.job_id
                && b.contractor_id == bid.contractor_id
                && b.status != BidStatus::Withdrawn
        });
        if duplicate {
            return Err(StoreError::Conflict("already bid on this job".to_string()));
        }
        bids.insert(bid.id, bid.clone());
        Ok(bid)
    }

    async fn get_bid_by_id(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let bids = self.bids.read().await;
        Ok(bids.get(&bid_id).cloned())
    }

    async fn get_bid_by_job_and_contractor(
        &self,
        job_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<Option<Bid>, StoreError> {
        let bids = self.bids.read().await;
        Ok(bids
            .values()
            .find(|b| {
                b.job_id == job_id
                    && b.contractor_id == contractor_id
                    && b.status != BidStatus::Withdrawn
            })
            .cloned())
    }

    async fn get_bids_for_job(&self, job_id: Uuid) -> Result<Vec<Bid>, StoreError> {
        let bids = self.bids.read().await;
        let mut result: Vec<Bid> = bids.values().filter(|b| b.job_id == job_id).cloned().collect();
        result.sort_by_key(|b| b.created_at);
        Ok(result)
    }

    async fn update_bid_status(&self, bid_id: Uuid, status: BidStatus) -> Result<Bid, StoreError> {
        let mut bids = self.bids.write().await;
        let bid = bids.get_mut(&bid_id).ok_or(StoreError::NotFound("bid"))?;
        bid.status = status;
        bid.updated_at = chrono::Utc::now();
        Ok(bid.clone())
    }
}
