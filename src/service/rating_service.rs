// service/rating_service.rs
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    models::reviewmodel::{ContractorProfile, Review},
    service::error::ServiceError,
    store::{reviewstore::ReviewExt, store::StoreClient},
};

/// Maintains contractor aggregate ratings. The aggregate is always recomputed
/// as the mean over every stored review rather than adjusted incrementally,
/// so it cannot drift from the underlying data.
#[derive(Debug, Clone)]
pub struct RatingService {
    store: Arc<StoreClient>,
}

impl RatingService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    pub async fn record_review(
        &self,
        contract_id: Uuid,
        contractor_id: Uuid,
        reviewer_id: Uuid,
        rating: i32,
        feedback: Option<String>,
    ) -> Result<ContractorProfile, ServiceError> {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        self.store
            .insert_review(Review {
                id: Uuid::new_v4(),
                contract_id,
                contractor_id,
                reviewer_id,
                rating,
                feedback,
                created_at: Utc::now(),
            })
            .await?;

        let reviews = self.store.get_reviews_for_contractor(contractor_id).await?;
        let mean = reviews.iter().map(|r| r.rating as f32).sum::<f32>() / reviews.len() as f32;

        let profile = self
            .store
            .update_contractor_rating(contractor_id, mean, reviews.len() as i32)
            .await?;

        tracing::info!(
            %contractor_id,
            rating = mean,
            reviews = reviews.len(),
            "contractor rating recomputed"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reviewmodel::ContractorProfile;

    #[tokio::test]
    async fn rating_is_mean_over_all_reviews() {
        let store = Arc::new(StoreClient::new());
        let contractor_id = Uuid::new_v4();
        store
            .upsert_contractor_profile(ContractorProfile::new(
                contractor_id,
                "Test Contractor".to_string(),
            ))
            .await
            .unwrap();

        let service = RatingService::new(store.clone());
        service
            .record_review(Uuid::new_v4(), contractor_id, Uuid::new_v4(), 5, None)
            .await
            .unwrap();
        let profile = service
            .record_review(Uuid::new_v4(), contractor_id, Uuid::new_v4(), 2, None)
            .await
            .unwrap();

        assert_eq!(profile.rating, Some(3.5));
        assert_eq!(profile.completed_jobs, 2);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let store = Arc::new(StoreClient::new());
        let service = RatingService::new(store);
        let result = service
            .record_review(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 6, None)
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
