pub mod config;
pub mod dtos;
pub mod models;
pub mod service;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::{
    config::Config,
    service::{
        audit_service::AuditService,
        bid_service::BidService,
        completion_service::CompletionService,
        contract_service::ContractService,
        dispute_service::DisputeService,
        escrow_service::EscrowService,
        locks::LockRegistry,
        notification_service::NotificationService,
        payment_provider::PaymentGateway,
        rating_service::RatingService,
    },
    store::store::StoreClient,
};

/// Everything wired together. One store, one gateway, one lock registry
/// shared by every service so the per-job and per-contract exclusive
/// sections actually line up across module boundaries.
#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Arc<Config>,
    pub store: Arc<StoreClient>,
    pub bid_service: Arc<BidService>,
    pub contract_service: Arc<ContractService>,
    pub escrow_service: Arc<EscrowService>,
    pub completion_service: Arc<CompletionService>,
    pub dispute_service: Arc<DisputeService>,
    pub rating_service: Arc<RatingService>,
    pub notification_service: Arc<NotificationService>,
    pub audit_service: Arc<AuditService>,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn PaymentGateway>) -> Self {
        let env = Arc::new(config);
        let store = Arc::new(StoreClient::new());
        let locks = LockRegistry::new();

        let notification_service = Arc::new(NotificationService::new());
        let audit_service = Arc::new(AuditService::new());
        let rating_service = Arc::new(RatingService::new(store.clone()));
        let escrow_service = Arc::new(EscrowService::new(
            store.clone(),
            gateway.clone(),
            audit_service.clone(),
            env.clone(),
        ));
        let bid_service = Arc::new(BidService::new(
            store.clone(),
            notification_service.clone(),
            env.clone(),
        ));
        let contract_service = Arc::new(ContractService::new(
            store.clone(),
            escrow_service.clone(),
            gateway.clone(),
            notification_service.clone(),
            audit_service.clone(),
            locks.clone(),
            env.clone(),
        ));
        let completion_service = Arc::new(CompletionService::new(
            store.clone(),
            escrow_service.clone(),
            rating_service.clone(),
            notification_service.clone(),
            audit_service.clone(),
            locks.clone(),
            env.clone(),
        ));
        let dispute_service = Arc::new(DisputeService::new(
            store.clone(),
            escrow_service.clone(),
            notification_service.clone(),
            audit_service.clone(),
            locks,
            env.clone(),
        ));

        Self {
            env,
            store,
            bid_service,
            contract_service,
            escrow_service,
            completion_service,
            dispute_service,
            rating_service,
            notification_service,
            audit_service,
        }
    }
}
