use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseConnection, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;

pub const CATEGORIES: [&str; 4] = ["candy", "chocolate", "cake", "cupcake"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sweet")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: String,
    pub stock: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("name required".into()));
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), errors::ModelError> {
    if !CATEGORIES.contains(&category) {
        return Err(errors::ModelError::Validation(format!("unknown category: {category}")));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), errors::ModelError> {
    if price < Decimal::ZERO {
        return Err(errors::ModelError::Validation("price must not be negative".into()));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    description: &str,
    price: Decimal,
    category: &str,
    image_url: &str,
    stock: i32,
) -> Result<Model, errors::ModelError> {
    validate_name(name)?;
    validate_category(category)?;
    validate_price(price)?;
    if stock < 0 {
        return Err(errors::ModelError::Validation("stock must not be negative".into()));
    }
    let now: DateTimeWithTimeZone = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        price: Set(price),
        category: Set(category.to_string()),
        image_url: Set(image_url.to_string()),
        stock: Set(stock),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Catalog listing: optional case-insensitive name substring and category
/// filters, ordered by name ascending.
pub async fn search(
    db: &DatabaseConnection,
    name_contains: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<Model>, errors::ModelError> {
    use sea_orm::sea_query::extension::postgres::PgExpr;
    use sea_orm::QueryFilter;

    let mut query = Entity::find();
    if let Some(needle) = name_contains {
        if !needle.is_empty() {
            query = query.filter(Expr::col(Column::Name).ilike(format!("%{needle}%")));
        }
    }
    if let Some(cat) = category {
        query = query.filter(Column::Category.eq(cat));
    }
    query
        .order_by_asc(Column::Name)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Conditional decrement: `stock = stock - qty WHERE id = ? AND stock >= qty`.
/// Returns the number of rows matched; zero means the product is missing or
/// short on stock, and nothing was written.
pub async fn decrement_stock<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    quantity: i32,
) -> Result<u64, errors::ModelError> {
    use sea_orm::QueryFilter;

    let res = Entity::update_many()
        .col_expr(Column::Stock, Expr::col(Column::Stock).sub(quantity))
        .col_expr(Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(Column::Id.eq(id))
        .filter(Column::Stock.gte(quantity))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected)
}

/// Additive update: `stock = stock + qty WHERE id = ?`. Returns rows matched.
pub async fn increment_stock<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    quantity: i32,
) -> Result<u64, errors::ModelError> {
    use sea_orm::QueryFilter;

    let res = Entity::update_many()
        .col_expr(Column::Stock, Expr::col(Column::Stock).add(quantity))
        .col_expr(Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected)
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected)
}
