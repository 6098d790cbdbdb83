//! # Registry Repository
//!
//! Repository for Registry entities: the owning collection items, purchases,
//! contributions, and activities all cascade from.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::registry::{
    ActiveModel as RegistryActiveModel, Column, Entity as Registry, Model, RegistryStatus,
};

/// Parameters for creating a registry
#[derive(Debug, Clone)]
pub struct NewRegistry {
    pub shop_domain: String,
    pub customer_email: Option<String>,
    pub title: String,
    pub slug: String,
    pub event_date: Option<DateTime<Utc>>,
}

/// Repository for Registry database operations
pub struct RegistryRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RegistryRepository<'a> {
    /// Create a new RegistryRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch a registry by id
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Model>, RepositoryError> {
        Registry::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Fetch a registry by its shop-scoped slug
    pub async fn find_by_slug(
        &self,
        shop_domain: &str,
        slug: &str,
    ) -> Result<Option<Model>, RepositoryError> {
        Registry::find()
            .filter(Column::ShopDomain.eq(shop_domain))
            .filter(Column::Slug.eq(slug))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Create a registry
    pub async fn create(&self, new: NewRegistry) -> Result<Model, RepositoryError> {
        let now = Utc::now();
        let active = RegistryActiveModel {
            id: Set(Uuid::new_v4()),
            shop_domain: Set(new.shop_domain),
            customer_email: Set(new.customer_email),
            title: Set(new.title),
            slug: Set(new.slug),
            status: Set(RegistryStatus::Active),
            event_date: Set(new.event_date.map(Into::into)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        active
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
