use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::errors::ServiceError;
use models::sweet;

/// List catalog products with optional filters.
///
/// `search` is a case-insensitive substring match on the name; `category`
/// of `"all"` (or None) applies no category filter. Results are ordered by
/// name ascending.
pub async fn list_sweets(
    db: &DatabaseConnection,
    search: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<sweet::Model>, ServiceError> {
    let category = match category {
        Some("all") | None => None,
        Some(other) => Some(other),
    };
    let rows = sweet::search(db, search, category).await?;
    Ok(rows)
}

/// Fetch a single product by id.
pub async fn get_sweet(db: &DatabaseConnection, id: Uuid) -> Result<sweet::Model, ServiceError> {
    sweet::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("Sweet"))
}
