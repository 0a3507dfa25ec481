// store/reviewstore.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::store::{StoreClient, StoreError};
use crate::models::reviewmodel::{ContractorProfile, Review};

#[async_trait]
pub trait ReviewExt {
    async fn upsert_contractor_profile(
        &self,
        profile: ContractorProfile,
    ) -> Result<ContractorProfile, StoreError>;

    async fn get_contractor_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ContractorProfile>, StoreError>;

    async fn insert_review(&self, review: Review) -> Result<Review, StoreError>;

    async fn get_reviews_for_contractor(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<Review>, StoreError>;

    async fn update_contractor_rating(
        &self,
        contractor_id: Uuid,
        rating: f32,
        completed_jobs: i32,
    ) -> Result<ContractorProfile, StoreError>;
}

#[async_trait]
impl ReviewExt for StoreClient {
    async fn upsert_contractor_profile(
        &self,
        profile: ContractorProfile,
    ) -> Result<ContractorProfile, StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn get_contractor_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ContractorProfile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&user_id).cloned())
    }

    async fn insert_review(&self, review: Review) -> Result<Review, StoreError> {
        let mut reviews = self.reviews.write().await;
        reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn get_reviews_for_contractor(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<Review>, StoreError> {
        let reviews = self.reviews.read().await;
        let mut result: Vec<Review> = reviews
            .values()
            .filter(|r| r.contractor_id == contractor_id)
            .cloned()
            .collect();
        result.sort_by_key(|r| r.created_at);
        Ok(result)
    }

    async fn update_contractor_rating(
        &self,
        contractor_id: Uuid,
        rating: f32,
        completed_jobs: i32,
    ) -> Result<ContractorProfile, StoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(&contractor_id)
            .ok_or(StoreError::NotFound("contractor profile"))?;
        profile.rating = Some(rating);
        profile.completed_jobs = completed_jobs;
        profile.updated_at = chrono::Utc::now();
        Ok(profile.clone())
    }
}
