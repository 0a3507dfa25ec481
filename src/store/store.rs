// store/store.rs
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    bidmodel::Bid,
    completionmodel::JobCompletion,
    contractmodel::{ChangeOrder, Contract},
    disputemodel::Dispute,
    escrowmodel::EscrowAccount,
    jobmodel::Job,
    reviewmodel::{ContractorProfile, Review},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// In-memory persistence client. Every entity collection sits behind its own
/// lock, and the multi-row operations the lifecycle needs (bid-acceptance
/// cascade, escrow log append) are single methods that take all their locks
/// at once.
#[derive(Debug, Clone, Default)]
pub struct StoreClient {
    pub(crate) jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    pub(crate) bids: Arc<RwLock<HashMap<Uuid, Bid>>>,
    pub(crate) contracts: Arc<RwLock<HashMap<Uuid, Contract>>>,
    pub(crate) change_orders: Arc<RwLock<HashMap<Uuid, ChangeOrder>>>,
    pub(crate) escrows: Arc<RwLock<HashMap<Uuid, EscrowAccount>>>,
    pub(crate) completions: Arc<RwLock<HashMap<Uuid, JobCompletion>>>,
    pub(crate) disputes: Arc<RwLock<HashMap<Uuid, Dispute>>>,
    pub(crate) profiles: Arc<RwLock<HashMap<Uuid, ContractorProfile>>>,
    pub(crate) reviews: Arc<RwLock<HashMap<Uuid, Review>>>,
}

impl StoreClient {
    pub fn new() -> Self {
        Self::default()
    }
}
