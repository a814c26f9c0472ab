use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::types::db::audit_event;
use crate::types::internal::audit::AuditEvent;
use crate::errors::InternalError;
use crate::errors::internal::AuditError;

/// Repository for audit event storage operations
pub struct AuditStore {
    db: DatabaseConnection,
}

impl AuditStore {
    /// Create a new AuditStore with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Write an audit event to the database
    ///
    /// Serializes the data HashMap to JSON and inserts the event into the
    /// audit_events table.
    ///
    /// # Errors
    ///
    /// Returns `InternalError` if serialization or database insert fails
    pub async fn write_event(&self, event: AuditEvent) -> Result<(), InternalError> {
        let data_json = serde_json::to_string(&event.data)
            .map_err(|e| AuditError::LogWriteFailed(format!("Failed to serialize audit data: {}", e)))?;

        let audit_event = audit_event::ActiveModel {
            id: sea_orm::ActiveValue::NotSet, // Let auto-increment handle this
            timestamp: Set(Utc::now().to_rfc3339()),
            event_type: Set(event.event_type.to_string()),
            user_id: Set(event.user_id),
            ip_address: Set(event.ip_address),
            jwt_id: Set(event.jwt_id),
            data: Set(data_json),
        };

        audit_event.insert(&self.db).await
            .map_err(|e| InternalError::database("write_audit_event", e))?;

        Ok(())
    }

    /// Events recorded for a user, oldest first
    pub async fn events_for_user(&self, user_id: &str) -> Result<Vec<audit_event::Model>, InternalError> {
        audit_event::Entity::find()
            .filter(audit_event::Column::UserId.eq(user_id))
            .order_by_asc(audit_event::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("find_audit_events", e))
    }

    /// Events of one type, oldest first
    pub async fn events_of_type(&self, event_type: &str) -> Result<Vec<audit_event::Model>, InternalError> {
        audit_event::Entity::find()
            .filter(audit_event::Column::EventType.eq(event_type))
            .order_by_asc(audit_event::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("find_audit_events", e))
    }
}
