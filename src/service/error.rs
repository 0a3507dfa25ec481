use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    bidmodel::BidStatus, completionmodel::CompletionStatus, contractmodel::ContractStatus,
    disputemodel::DisputeStatus, escrowmodel::EscrowStatus,
};
use crate::service::payment_provider::PaymentError;
use crate::store::store::StoreError;

/// Coarse classification callers switch on, in the manner of an HTTP status
/// mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    Conflict,
    Upstream,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Bid {0} not found")]
    BidNotFound(Uuid),

    #[error("Contract {0} not found")]
    ContractNotFound(Uuid),

    #[error("Escrow account not found for contract {0}")]
    EscrowNotFound(Uuid),

    #[error("Completion {0} not found")]
    CompletionNotFound(Uuid),

    #[error("Dispute {0} not found")]
    DisputeNotFound(Uuid),

    #[error("Change order {0} not found")]
    ChangeOrderNotFound(Uuid),

    #[error("Job {0} is not accepting bids")]
    JobNotOpen(Uuid),

    #[error("Contractor {0} has already bid on job {1}")]
    DuplicateBid(Uuid, Uuid),

    #[error("Bid amount {0} is below the platform minimum {1}")]
    AmountBelowMinimum(String, String),

    #[error("Bid {0} is no longer available (status {1:?})")]
    BidNoLongerAvailable(Uuid, BidStatus),

    #[error("Job {0} already has a contract")]
    JobAlreadyAwarded(Uuid),

    #[error("User {0} may not view bids on job {1}")]
    BlindBiddingViolation(Uuid, Uuid),

    #[error("Contract {0} is not active (status {1:?})")]
    ContractNotActive(Uuid, ContractStatus),

    #[error("Completion {0} is not awaiting review (status {1:?})")]
    CompletionNotPending(Uuid, CompletionStatus),

    #[error("Invalid escrow state transition: {0:?} -> {1:?}")]
    InvalidEscrowTransition(EscrowStatus, EscrowStatus),

    #[error("Escrow for contract {0} already has a terminal resolution")]
    EscrowAlreadyResolved(Uuid),

    #[error("Dispute {0} is already resolved")]
    DisputeAlreadyResolved(Uuid),

    #[error("Dispute {0} does not accept this action in status {1:?}")]
    InvalidDisputeStatus(Uuid, DisputeStatus),

    #[error("Mediation deadline for dispute {0} has passed")]
    MediationDeadlinePassed(Uuid),

    #[error("User {0} is not authorized to perform this action")]
    Unauthorized(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment gateway error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::BidNotFound(_)
            | ServiceError::ContractNotFound(_)
            | ServiceError::EscrowNotFound(_)
            | ServiceError::CompletionNotFound(_)
            | ServiceError::DisputeNotFound(_)
            | ServiceError::ChangeOrderNotFound(_)
            | ServiceError::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,

            ServiceError::JobNotOpen(_)
            | ServiceError::DuplicateBid(_, _)
            | ServiceError::BidNoLongerAvailable(_, _)
            | ServiceError::JobAlreadyAwarded(_)
            | ServiceError::ContractNotActive(_, _)
            | ServiceError::CompletionNotPending(_, _)
            | ServiceError::InvalidEscrowTransition(_, _)
            | ServiceError::EscrowAlreadyResolved(_)
            | ServiceError::DisputeAlreadyResolved(_)
            | ServiceError::InvalidDisputeStatus(_, _)
            | ServiceError::MediationDeadlinePassed(_)
            | ServiceError::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,

            ServiceError::BlindBiddingViolation(_, _) | ServiceError::Unauthorized(_) => {
                ErrorKind::Authorization
            }

            ServiceError::AmountBelowMinimum(_, _) | ServiceError::Validation(_) => {
                ErrorKind::Validation
            }

            ServiceError::Payment(_) => ErrorKind::Upstream,
        }
    }
}
