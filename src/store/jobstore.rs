// store/jobstore.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::store::{StoreClient, StoreError};
use crate::models::jobmodel::{Job, JobStatus};

#[async_trait]
pub trait JobExt {
    async fn insert_job(&self, job: Job) -> Result<Job, StoreError>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;

    async fn update_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<Job, StoreError>;
}

#[async_trait]
impl JobExt for StoreClient {
    async fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(&job_id).cloned())
    }

    async fn update_job_status(&self, job_id: Uuid, status: JobStatus) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound("job"))?;
        job.status = status;
        job.updated_at = chrono::Utc::now();
        Ok(job.clone())
    }
}
