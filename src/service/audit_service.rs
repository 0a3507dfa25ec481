// service/audit_service.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::service::error::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only trail of lifecycle transitions, one event per state change.
#[derive(Debug, Clone, Default)]
pub struct AuditService {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl AuditService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn log_event(
        &self,
        actor_id: Uuid,
        action: &str,
        entity_id: Option<Uuid>,
        metadata: Option<serde_json::Value>,
        description: String,
    ) -> Result<(), ServiceError> {
        tracing::debug!(%actor_id, action, "audit: {}", description);
        let mut events = self.events.write().await;
        events.push(AuditEvent {
            id: Uuid::new_v4(),
            actor_id,
            action: action.to_string(),
            entity_id,
            metadata,
            description,
            recorded_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn events_for_entity(&self, entity_id: Uuid) -> Vec<AuditEvent> {
        let events = self.events.read().await;
        events
            .iter()
            .filter(|e| e.entity_id == Some(entity_id))
            .cloned()
            .collect()
    }
}
