//! # Registry Item Store
//!
//! Repository for RegistryItem entities: lookups, item lifecycle, and the
//! atomic quantity_purchased increment the purchase ledger applies inside
//! its own transaction. There is no read-modify-write path to the purchased
//! quantity anywhere in this crate.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::registry_item::{
    ActiveModel as RegistryItemActiveModel, Column, Entity as RegistryItem, Model,
    RegistryItemStatus,
};

/// Parameters for adding a product to a registry
#[derive(Debug, Clone)]
pub struct NewRegistryItem {
    pub registry_id: Uuid,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub currency_code: String,
}

/// Repository for RegistryItem database operations
pub struct RegistryItemRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RegistryItemRepository<'a> {
    /// Create a new RegistryItemRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch an item by id
    pub async fn get_item(&self, id: Uuid) -> Result<Option<Model>, RepositoryError> {
        RegistryItem::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List items for a registry, newest first
    pub async fn list_for_registry(&self, registry_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        RegistryItem::find()
            .filter(Column::RegistryId.eq(registry_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Add a product to a registry
    pub async fn add_item(&self, item: NewRegistryItem) -> Result<Model, RepositoryError> {
        let now = Utc::now();
        let active = RegistryItemActiveModel {
            id: Set(Uuid::new_v4()),
            registry_id: Set(item.registry_id),
            product_id: Set(item.product_id),
            variant_id: Set(item.variant_id),
            title: Set(item.title),
            quantity: Set(item.quantity),
            quantity_purchased: Set(0),
            unit_price: Set(item.unit_price),
            currency_code: Set(item.currency_code),
            status: Set(RegistryItemStatus::Active),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        active
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Soft-deactivate an item. Purchases referencing it survive, and already
    /// placed orders keep reconciling against it.
    pub async fn deactivate(&self, id: Uuid) -> Result<Model, RepositoryError> {
        let item = self
            .get_item(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("registry item".to_string()))?;

        let mut active: RegistryItemActiveModel = item.into();
        active.status = Set(RegistryItemStatus::Inactive);
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Atomically add `delta` to quantity_purchased inside the caller's
    /// transaction.
    ///
    /// This is a single `UPDATE ... SET quantity_purchased =
    /// quantity_purchased + delta` so concurrent line items for the same item
    /// can never lose updates. Inactive items still increment: a purchase
    /// placed while the item was live reconciles after removal. The value is
    /// not clamped to the target quantity; over-purchase is recorded and
    /// surfaced by the storefront.
    pub async fn increment_purchased<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        delta: i32,
    ) -> Result<Model, RepositoryError> {
        debug_assert!(delta > 0);

        let result = RegistryItem::update_many()
            .col_expr(
                Column::QuantityPurchased,
                Expr::col(Column::QuantityPurchased).add(delta),
            )
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound("registry item".to_string()));
        }

        RegistryItem::find_by_id(id)
            .one(conn)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::NotFound("registry item".to_string()))
    }
}
