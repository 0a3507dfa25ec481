use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::completionmodel::GeoPoint;
use crate::models::disputemodel::ResolutionPath;

// Bid DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitBidDto {
    pub job_id: Uuid,

    #[validate(range(min = 1.0, message = "Amount must be positive"))]
    pub amount: f64,

    #[validate(range(min = 1, max = 365, message = "Timeline must be between 1 and 365 days"))]
    pub timeline_days: i32,

    #[validate(length(min = 20, max = 2000, message = "Proposal must be between 20 and 2000 characters"))]
    pub proposal: String,
}

// Change order DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateChangeOrderDto {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(min = 10, max = 1000, message = "Description must be between 10 and 1000 characters"))]
    pub description: String,

    #[validate(range(min = 1.0, message = "Amount must be positive"))]
    pub amount: f64,
}

// Completion DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitCompletionDto {
    pub contract_id: Uuid,

    #[validate(length(min = 1, max = 20, message = "Between 1 and 20 photos are required"))]
    pub photos: Vec<String>,

    #[validate(length(max = 5, message = "At most 5 videos are allowed"))]
    pub videos: Vec<String>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    pub geolocation: Option<GeoPoint>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewCompletionDto {
    pub approved: bool,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,

    #[validate(length(max = 1000, message = "Feedback must be at most 1000 characters"))]
    pub feedback: Option<String>,
}

// Dispute DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InitiateDisputeDto {
    pub completion_id: Uuid,

    #[validate(length(min = 10, max = 200, message = "Reason must be between 10 and 200 characters"))]
    pub reason: String,

    #[validate(length(min = 10, max = 2000, message = "Description must be between 10 and 2000 characters"))]
    pub description: String,

    #[validate(length(max = 20, message = "At most 20 evidence items are allowed"))]
    pub evidence_urls: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DisputeResponseDto {
    #[validate(length(min = 10, max = 2000, message = "Response must be between 10 and 2000 characters"))]
    pub message: String,

    #[validate(length(max = 20, message = "At most 20 evidence items are allowed"))]
    pub evidence_urls: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResolveDisputeDto {
    pub resolution_path: ResolutionPath,

    #[validate(length(min = 10, max = 2000, message = "Reasoning must be between 10 and 2000 characters"))]
    pub reasoning: String,

    #[validate(range(min = 0.0, max = 100.0, message = "Percentage must be between 0 and 100"))]
    pub partial_refund_percentage: Option<f64>,
}
