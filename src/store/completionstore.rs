// store/completionstore.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::store::{StoreClient, StoreError};
use crate::models::completionmodel::{CompletionStatus, JobCompletion};

#[async_trait]
pub trait CompletionExt {
    async fn insert_completion(
        &self,
        completion: JobCompletion,
    ) -> Result<JobCompletion, StoreError>;

    async fn get_completion_by_id(
        &self,
        completion_id: Uuid,
    ) -> Result<Option<JobCompletion>, StoreError>;

    /// The completion currently awaiting review for a contract, if any.
    async fn get_pending_completion_for_contract(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<JobCompletion>, StoreError>;

    async fn update_completion(
        &self,
        completion: JobCompletion,
    ) -> Result<JobCompletion, StoreError>;
}

#[async_trait]
impl CompletionExt for StoreClient {
    async fn insert_completion(
        &self,
        completion: JobCompletion,
    ) -> Result<JobCompletion, StoreError> {
        let mut completions = self.completions.write().await;
        let pending = completions.values().any(|c| {
            c.contract_id == completion.contract_id && c.status == CompletionStatus::Submitted
        });
        if pending {
            return Err(StoreError::Conflict(
                "a completion is already awaiting review".to_string(),
            ));
        }
        completions.insert(completion.id, completion.clone());
        Ok(completion)
    }

    async fn get_completion_by_id(
        &self,
        completion_id: Uuid,
    ) -> Result<Option<JobCompletion>, StoreError> {
        let completions = self.completions.read().await;
        Ok(completions.get(&completion_id).cloned())
    }

    async fn get_pending_completion_for_contract(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<JobCompletion>, StoreError> {
        let completions = self.completions.read().await;
        Ok(completions
            .values()
            .find(|c| c.contract_id == contract_id && c.status == CompletionStatus::Submitted)
            .cloned())
    }

    async fn update_completion(
        &self,
        completion: JobCompletion,
    ) -> Result<JobCompletion, StoreError> {
        let mut completions = self.completions.write().await;
        if !completions.contains_key(&completion.id) {
            return Err(StoreError::NotFound("completion"));
        }
        completions.insert(completion.id, completion.clone());
        Ok(completion)
    }
}
