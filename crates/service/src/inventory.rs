use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use models::{purchase, sweet};

/// Full product payload used by create and update (update is a full
/// replace of the mutable fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweetInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub stock: i32,
}

/// Result of a successful purchase.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub purchase_id: Uuid,
    pub total_price: Decimal,
}

pub async fn create_sweet(db: &DatabaseConnection, input: SweetInput) -> Result<sweet::Model, ServiceError> {
    let created = sweet::create(
        db,
        &input.name,
        &input.description,
        input.price,
        &input.category,
        &input.image_url,
        input.stock,
    )
    .await?;
    info!(sweet_id = %created.id, name = %created.name, "sweet_created");
    Ok(created)
}

pub async fn update_sweet(
    db: &DatabaseConnection,
    id: Uuid,
    input: SweetInput,
) -> Result<sweet::Model, ServiceError> {
    sweet::validate_name(&input.name)?;
    sweet::validate_category(&input.category)?;
    sweet::validate_price(input.price)?;
    if input.stock < 0 {
        return Err(ServiceError::Validation("stock must not be negative".into()));
    }
    let mut am: sweet::ActiveModel = sweet::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("sweet"))?
        .into();
    am.name = Set(input.name);
    am.description = Set(input.description);
    am.price = Set(input.price);
    am.category = Set(input.category);
    am.image_url = Set(input.image_url);
    am.stock = Set(input.stock);
    am.updated_at = Set(chrono::Utc::now().into());
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(updated)
}

/// Delete a product. Historical purchase rows referencing it are left in
/// place as orphaned references.
pub async fn delete_sweet(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let removed = sweet::hard_delete(db, id).await?;
    if removed == 0 {
        return Err(ServiceError::not_found("sweet"));
    }
    info!(sweet_id = %id, "sweet_deleted");
    Ok(())
}

/// Purchase `quantity` units of a product for `user_id`.
///
/// The stock check and decrement are one conditional UPDATE inside a
/// transaction, so two concurrent purchases can never drive stock
/// negative; the loser of the race gets `InsufficientStock` and no
/// purchase row is recorded for it.
#[instrument(skip(db))]
pub async fn purchase(
    db: &DatabaseConnection,
    user_id: Uuid,
    sweet_id: Uuid,
    quantity: i32,
) -> Result<PurchaseReceipt, ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::Validation("quantity must be positive".into()));
    }

    let txn = db.begin().await.map_err(|e| ServiceError::Db(e.to_string()))?;

    let found = sweet::Entity::find_by_id(sweet_id)
        .one(&txn)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("Sweet"))?;

    let matched = sweet::decrement_stock(&txn, sweet_id, quantity).await?;
    if matched == 0 {
        txn.rollback().await.map_err(|e| ServiceError::Db(e.to_string()))?;
        return Err(ServiceError::InsufficientStock);
    }

    // Total is a point-in-time copy of the price, not a live reference.
    let total = found.price * Decimal::from(quantity);
    let row = purchase::create(&txn, user_id, sweet_id, quantity, total).await?;

    txn.commit().await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(%user_id, %sweet_id, quantity, total = %total, "purchase_recorded");
    Ok(PurchaseReceipt { purchase_id: row.id, total_price: total })
}

/// Increase a product's stock by `quantity` and return the updated row.
#[instrument(skip(db))]
pub async fn restock(
    db: &DatabaseConnection,
    sweet_id: Uuid,
    quantity: i32,
) -> Result<sweet::Model, ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::Validation("quantity must be positive".into()));
    }
    let matched = sweet::increment_stock(db, sweet_id, quantity).await?;
    if matched == 0 {
        return Err(ServiceError::not_found("Sweet"));
    }
    let updated = sweet::Entity::find_by_id(sweet_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("Sweet"))?;
    info!(%sweet_id, quantity, stock = updated.stock, "sweet_restocked");
    Ok(updated)
}
