// store/contractstore.rs
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::store::{StoreClient, StoreError};
use crate::models::{
    bidmodel::BidStatus,
    contractmodel::{ChangeOrder, Contract},
    jobmodel::JobStatus,
};

#[async_trait]
pub trait ContractExt {
    /// The acceptance cascade as one unit: re-validate the bid is still
    /// Submitted and the job unclaimed, flip it to Accepted, reject every
    /// sibling Submitted bid, insert the contract, and move the job to
    /// InProgress. Either all of it happens or none of it does.
    ///
    /// Returns the contract plus the ids of the rejected sibling bids.
    async fn accept_bid_and_reject_siblings(
        &self,
        contract: Contract,
    ) -> Result<(Contract, Vec<Uuid>), StoreError>;

    async fn get_contract_by_id(&self, contract_id: Uuid) -> Result<Option<Contract>, StoreError>;

    async fn get_contract_by_job_id(&self, job_id: Uuid) -> Result<Option<Contract>, StoreError>;

    async fn update_contract(&self, contract: Contract) -> Result<Contract, StoreError>;

    async fn insert_change_order(&self, order: ChangeOrder) -> Result<ChangeOrder, StoreError>;

    async fn get_change_order_by_id(
        &self,
        order_id: Uuid,
    ) -> Result<Option<ChangeOrder>, StoreError>;

    async fn update_change_order(&self, order: ChangeOrder) -> Result<ChangeOrder, StoreError>;

    async fn get_change_orders_for_contract(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<ChangeOrder>, StoreError>;
}

#[async_trait]
impl ContractExt for StoreClient {
    async fn accept_bid_and_reject_siblings(
        &self,
        contract: Contract,
    ) -> Result<(Contract, Vec<Uuid>), StoreError> {
        // Lock order: jobs, bids, contracts. Everything below happens under
        // all three write locks, so no partial cascade is observable.
        let mut jobs = self.jobs.write().await;
        let mut bids = self.bids.write().await;
        let mut contracts = self.contracts.write().await;

        if contracts.values().any(|c| c.job_id == contract.job_id) {
            return Err(StoreError::Conflict("job already has a contract".to_string()));
        }

        {
            let accepted = bids
                .get_mut(&contract.bid_id)
                .ok_or(StoreError::NotFound("bid"))?;
            if accepted.status != BidStatus::Submitted {
                return Err(StoreError::Conflict("bid no longer available".to_string()));
            }
            accepted.status = BidStatus::Accepted;
            accepted.updated_at = Utc::now();
        }

        let mut rejected = Vec::new();
        for bid in bids.values_mut() {
            if bid.job_id == contract.job_id
                && bid.id != contract.bid_id
                && bid.status == BidStatus::Submitted
            {
                bid.status = BidStatus::Rejected;
                bid.updated_at = Utc::now();
                rejected.push(bid.id);
            }
        }

        if let Some(job) = jobs.get_mut(&contract.job_id) {
            job.status = JobStatus::InProgress;
            job.updated_at = Utc::now();
        }

        contracts.insert(contract.id, contract.clone());
        Ok((contract, rejected))
    }

    async fn get_contract_by_id(&self, contract_id: Uuid) -> Result<Option<Contract>, StoreError> {
        let contracts = self.contracts.read().await;
        Ok(contracts.get(&contract_id).cloned())
    }

    async fn get_contract_by_job_id(&self, job_id: Uuid) -> Result<Option<Contract>, StoreError> {
        let contracts = self.contracts.read().await;
        Ok(contracts.values().find(|c| c.job_id == job_id).cloned())
    }

    async fn update_contract(&self, contract: Contract) -> Result<Contract, StoreError> {
        let mut contracts = self.contracts.write().await;
        if !contracts.contains_key(&contract.id) {
            return Err(StoreError::NotFound("contract"));
        }
        contracts.insert(contract.id, contract.clone());
        Ok(contract)
    }

    async fn insert_change_order(&self, order: ChangeOrder) -> Result<ChangeOrder, StoreError> {
        let mut orders = self.change_orders.write().await;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_change_order_by_id(
        &self,
        order_id: Uuid,
    ) -> Result<Option<ChangeOrder>, StoreError> {
        let orders = self.change_orders.read().await;
        Ok(orders.get(&order_id).cloned())
    }

    async fn update_change_order(&self, order: ChangeOrder) -> Result<ChangeOrder, StoreError> {
        let mut orders = self.change_orders.write().await;
        if !orders.contains_key(&order.id) {
            return Err(StoreError::NotFound("change order"));
        }
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_change_orders_for_contract(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<ChangeOrder>, StoreError> {
        let orders = self.change_orders.read().await;
        let mut result: Vec<ChangeOrder> = orders
            .values()
            .filter(|o| o.contract_id == contract_id)
            .cloned()
            .collect();
        result.sort_by_key(|o| o.created_at);
        Ok(result)
    }
}
