//! # Activity Recorder
//!
//! Append-only repository for registry activity records. There is no update
//! or delete path; the analytics/notification collaborators consume rows as
//! written. Reconciliation callers use `record_best_effort`, which never
//! propagates a failure: financial accuracy outranks audit completeness.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::activity::{
    ActiveModel as ActivityActiveModel, ActivityAction, Column, Entity as Activity, Model,
};

/// Who performed the action: a named actor or the system itself
#[derive(Debug, Clone)]
pub enum Actor {
    Person {
        name: Option<String>,
        email: Option<String>,
    },
    System,
}

/// Repository for ActivityRecord database operations
pub struct ActivityRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ActivityRepository<'a> {
    /// Create a new ActivityRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append an activity record
    pub async fn record(
        &self,
        registry_id: Uuid,
        action: ActivityAction,
        description: String,
        metadata: Option<JsonValue>,
        actor: Actor,
    ) -> Result<Model, RepositoryError> {
        let (actor_name, actor_email, is_system) = match actor {
            Actor::Person { name, email } => (name, email, false),
            Actor::System => (None, None, true),
        };

        let active = ActivityActiveModel {
            id: Set(Uuid::new_v4()),
            registry_id: Set(registry_id),
            actor_name: Set(actor_name),
            actor_email: Set(actor_email),
            is_system: Set(is_system),
            action: Set(action),
            description: Set(description),
            metadata: Set(metadata),
            created_at: Set(Utc::now().into()),
        };

        active
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Append an activity record without failing the caller.
    ///
    /// Reconciliation has already committed when this runs; a lost audit row
    /// is logged and accepted.
    pub async fn record_best_effort(
        &self,
        registry_id: Uuid,
        action: ActivityAction,
        description: String,
        metadata: Option<JsonValue>,
        actor: Actor,
    ) {
        if let Err(err) = self
            .record(registry_id, action, description, metadata, actor)
            .await
        {
            warn!(
                registry_id = %registry_id,
                error = %err,
                "failed to append activity record, continuing"
            );
        }
    }

    /// List activities for a registry, newest first
    pub async fn list_for_registry(
        &self,
        registry_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Model>, RepositoryError> {
        Activity::find()
            .filter(Column::RegistryId.eq(registry_id))
            .order_by_desc(Column::CreatedAt)
            .offset(offset as u64)
            .limit(limit as u64)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_test_db;
    use serde_json::json;

    #[tokio::test]
    async fn test_record_and_list() {
        let db = setup_test_db().await;
        let registry = crate::test_support::seed_registry(&db).await;
        let repo = ActivityRepository::new(&db);

        repo.record(
            registry.id,
            ActivityAction::ItemAdded,
            "Stand Mixer added".to_string(),
            Some(json!({"product_id": "prod_1"})),
            Actor::Person {
                name: Some("Ada".to_string()),
                email: None,
            },
        )
        .await
        .unwrap();

        repo.record(
            registry.id,
            ActivityAction::ItemPurchased,
            "Stand Mixer purchased".to_string(),
            None,
            Actor::System,
        )
        .await
        .unwrap();

        let activities = repo.list_for_registry(registry.id, 50, 0).await.unwrap();
        assert_eq!(activities.len(), 2);
        assert!(activities.iter().any(|a| a.is_system));
        assert!(
            activities
                .iter()
                .any(|a| a.actor_name == Some("Ada".to_string()))
        );
    }

    #[tokio::test]
    async fn test_record_best_effort_swallows_failure() {
        let db = setup_test_db().await;
        let repo = ActivityRepository::new(&db);

        // Unknown registry violates the foreign key; the call must not panic
        // or surface an error.
        repo.record_best_effort(
            Uuid::new_v4(),
            ActivityAction::ItemPurchased,
            "orphan event".to_string(),
            None,
            Actor::System,
        )
        .await;
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let db = setup_test_db().await;
        let registry = crate::test_support::seed_registry(&db).await;
        let repo = ActivityRepository::new(&db);

        for i in 0..5 {
            repo.record(
                registry.id,
                ActivityAction::ItemAdded,
                format!("item {}", i),
                None,
                Actor::System,
            )
            .await
            .unwrap();
        }

        let first = repo.list_for_registry(registry.id, 2, 0).await.unwrap();
        let second = repo.list_for_registry(registry.id, 2, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_ne!(first[0].id, second[0].id);
    }
}
