// service/notification_service.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::service::error::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: String,
    pub related_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Fire-and-forget outbound notifications. Delivery is an external concern;
/// here they are logged and queued. Callers treat a failure as non-fatal to
/// the state transition that produced it.
#[derive(Debug, Clone, Default)]
pub struct NotificationService {
    outbox: Arc<RwLock<Vec<NotificationRecord>>>,
}

impl NotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notify(
        &self,
        user_id: Uuid,
        event_type: &str,
        related_id: Option<Uuid>,
        payload: Option<serde_json::Value>,
        message: String,
    ) -> Result<(), ServiceError> {
        tracing::info!(%user_id, event_type, "notification queued: {}", message);
        let mut outbox = self.outbox.write().await;
        outbox.push(NotificationRecord {
            id: Uuid::new_v4(),
            user_id,
            event_type: event_type.to_string(),
            related_id,
            payload,
            message,
            created_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn notify_bid_submitted(
        &self,
        homeowner_id: Uuid,
        job_id: Uuid,
        bid_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.notify(
            homeowner_id,
            "bid_submitted",
            Some(bid_id),
            Some(serde_json::json!({ "job_id": job_id })),
            "A new bid has been submitted on your job".to_string(),
        )
        .await
    }

    pub async fn notify_bid_decided(
        &self,
        contractor_id: Uuid,
        bid_id: Uuid,
        accepted: bool,
    ) -> Result<(), ServiceError> {
        let (event, message) = if accepted {
            ("bid_accepted", "Your bid was accepted")
        } else {
            ("bid_rejected", "Your bid was not selected")
        };
        self.notify(contractor_id, event, Some(bid_id), None, message.to_string())
            .await
    }

    pub async fn notify_completion_submitted(
        &self,
        homeowner_id: Uuid,
        completion_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.notify(
            homeowner_id,
            "completion_submitted",
            Some(completion_id),
            None,
            "Work has been submitted for your approval".to_string(),
        )
        .await
    }

    pub async fn notify_completion_reviewed(
        &self,
        contractor_id: Uuid,
        completion_id: Uuid,
        approved: bool,
    ) -> Result<(), ServiceError> {
        let (event, message) = if approved {
            ("completion_approved", "Your work was approved and payment released")
        } else {
            ("completion_rejected", "Your submission was rejected; you may resubmit")
        };
        self.notify(contractor_id, event, Some(completion_id), None, message.to_string())
            .await
    }

    pub async fn notify_dispute_opened(
        &self,
        contractor_id: Uuid,
        dispute_id: Uuid,
        deadline: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        self.notify(
            contractor_id,
            "dispute_opened",
            Some(dispute_id),
            Some(serde_json::json!({ "mediation_deadline": deadline })),
            "A dispute was opened against your submission".to_string(),
        )
        .await
    }

    pub async fn notify_dispute_resolved(
        &self,
        user_id: Uuid,
        dispute_id: Uuid,
        path: &str,
    ) -> Result<(), ServiceError> {
        self.notify(
            user_id,
            "dispute_resolved",
            Some(dispute_id),
            Some(serde_json::json!({ "resolution_path": path })),
            format!("Dispute resolved: {path}"),
        )
        .await
    }

    pub async fn sent_to(&self, user_id: Uuid) -> Vec<NotificationRecord> {
        let outbox = self.outbox.read().await;
        outbox.iter().filter(|n| n.user_id == user_id).cloned().collect()
    }
}
