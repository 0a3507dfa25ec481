// store/escrowstore.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::store::{StoreClient, StoreError};
use crate::models::escrowmodel::EscrowAccount;

#[async_trait]
pub trait EscrowExt {
    async fn insert_escrow_account(
        &self,
        account: EscrowAccount,
    ) -> Result<EscrowAccount, StoreError>;

    async fn get_escrow_by_contract_id(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<EscrowAccount>, StoreError>;

    /// Persist a mutated account. The write is rejected if it would rewrite
    /// history (the new log must extend the stored one) or re-resolve an
    /// account already in a terminal state. This is the at-most-one-terminal
    /// guarantee enforced at the lowest level.
    async fn update_escrow_account(
        &self,
        account: EscrowAccount,
    ) -> Result<EscrowAccount, StoreError>;
}

#[async_trait]
impl EscrowExt for StoreClient {
    async fn insert_escrow_account(
        &self,
        account: EscrowAccount,
    ) -> Result<EscrowAccount, StoreError> {
        let mut escrows = self.escrows.write().await;
        if escrows.values().any(|a| a.contract_id == account.contract_id) {
            return Err(StoreError::Conflict(
                "contract already has an escrow account".to_string(),
            ));
        }
        escrows.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_escrow_by_contract_id(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<EscrowAccount>, StoreError> {
        let escrows = self.escrows.read().await;
        Ok(escrows.values().find(|a| a.contract_id == contract_id).cloned())
    }

    async fn update_escrow_account(
        &self,
        account: EscrowAccount,
    ) -> Result<EscrowAccount, StoreError> {
        let mut escrows = self.escrows.write().await;
        let stored = escrows
            .get(&account.id)
            .ok_or(StoreError::NotFound("escrow account"))?;

        if stored.status.is_terminal() {
            return Err(StoreError::Conflict(
                "escrow account already resolved".to_string(),
            ));
        }
        let is_extension = account.transactions.len() >= stored.transactions.len()
            && stored
                .transactions
                .iter()
                .zip(account.transactions.iter())
                .all(|(old, new)| old.id == new.id);
        if !is_extension {
            return Err(StoreError::Conflict(
                "escrow transaction log is append-only".to_string(),
            ));
        }

        escrows.insert(account.id, account.clone());
        Ok(account)
    }
}
