// store/disputestore.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::store::{StoreClient, StoreError};
use crate::models::disputemodel::Dispute;

#[async_trait]
pub trait DisputeExt {
    async fn insert_dispute(&self, dispute: Dispute) -> Result<Dispute, StoreError>;

    async fn get_dispute_by_id(&self, dispute_id: Uuid) -> Result<Option<Dispute>, StoreError>;

    async fn get_dispute_by_completion_id(
        &self,
        completion_id: Uuid,
    ) -> Result<Option<Dispute>, StoreError>;

    async fn update_dispute(&self, dispute: Dispute) -> Result<Dispute, StoreError>;

    /// Pending/Mediation disputes, for the external deadline scheduler.
    async fn get_open_disputes(&self) -> Result<Vec<Dispute>, StoreError>;
}

#[async_trait]
impl DisputeExt for StoreClient {
    async fn insert_dispute(&self, dispute: Dispute) -> Result<Dispute, StoreError> {
        let mut disputes = self.disputes.write().await;
        if disputes
            .values()
            .any(|d| d.completion_id == dispute.completion_id && d.is_open())
        {
            return Err(StoreError::Conflict(
                "completion already has an open dispute".to_string(),
            ));
        }
        disputes.insert(dispute.id, dispute.clone());
        Ok(dispute)
    }

    async fn get_dispute_by_id(&self, dispute_id: Uuid) -> Result<Option<Dispute>, StoreError> {
        let disputes = self.disputes.read().await;
        Ok(disputes.get(&dispute_id).cloned())
    }

    async fn get_dispute_by_completion_id(
        &self,
        completion_id: Uuid,
    ) -> Result<Option<Dispute>, StoreError> {
        let disputes = self.disputes.read().await;
        Ok(disputes
            .values()
            .find(|d| d.completion_id == completion_id)
            .cloned())
    }

    async fn update_dispute(&self, dispute: Dispute) -> Result<Dispute, StoreError> {
        let mut disputes = self.disputes.write().await;
        if !disputes.contains_key(&dispute.id) {
            return Err(StoreError::NotFound("dispute"));
        }
        disputes.insert(dispute.id, dispute.clone());
        Ok(dispute)
    }

    async fn get_open_disputes(&self) -> Result<Vec<Dispute>, StoreError> {
        let disputes = self.disputes.read().await;
        let mut result: Vec<Dispute> = disputes.values().filter(|d| d.is_open()).cloned().collect();
        result.sort_by_key(|d| d.created_at);
        Ok(result)
    }
}
