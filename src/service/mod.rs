pub mod audit_service;
pub mod bid_service;
pub mod completion_service;
pub mod contract_service;
pub mod dispute_service;
pub mod error;
pub mod escrow_service;
pub mod locks;
pub mod notification_service;
pub mod payment_provider;
pub mod rating_service;
