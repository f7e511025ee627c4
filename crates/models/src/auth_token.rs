use chrono::{Duration, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors, profile};

pub const PURPOSE_SIGNUP: &str = "signup";
pub const PURPOSE_RECOVERY: &str = "recovery";

/// One-shot token backing email verification and password reset links.
/// A token is usable while `consumed_at` is NULL and `expires_at` is in
/// the future; redeeming it stamps `consumed_at`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub purpose: String,
    pub expires_at: DateTimeWithTimeZone,
    pub consumed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Profile,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Profile => Entity::belongs_to(profile::Entity)
                .from(Column::UserId)
                .to(profile::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn issue(
    db: &DatabaseConnection,
    user_id: Uuid,
    purpose: &str,
    ttl_minutes: i64,
) -> Result<Model, errors::ModelError> {
    if purpose != PURPOSE_SIGNUP && purpose != PURPOSE_RECOVERY {
        return Err(errors::ModelError::Validation(format!("unknown token purpose: {purpose}")));
    }
    if ttl_minutes < 1 {
        return Err(errors::ModelError::Validation("token ttl must be positive".into()));
    }
    let now = Utc::now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        token: Set(Uuid::new_v4().simple().to_string()),
        purpose: Set(purpose.to_string()),
        expires_at: Set((now + Duration::minutes(ttl_minutes)).into()),
        consumed_at: Set(None),
        created_at: Set(now.into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Find a token that is still redeemable: right purpose, not consumed,
/// not expired.
pub async fn find_valid(
    db: &DatabaseConnection,
    token: &str,
    purpose: &str,
) -> Result<Option<Model>, errors::ModelError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    Entity::find()
        .filter(Column::Token.eq(token))
        .filter(Column::Purpose.eq(purpose))
        .filter(Column::ConsumedAt.is_null())
        .filter(Column::ExpiresAt.gt(now))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Redeem a token. Returns the owning user id, or None when the token is
/// unknown, already consumed, or expired.
///
/// The stamp is conditional on `consumed_at IS NULL`, so when two
/// redemptions race only one matches the row and the other gets None.
pub async fn consume(
    db: &DatabaseConnection,
    token: &str,
    purpose: &str,
) -> Result<Option<Uuid>, errors::ModelError> {
    let Some(found) = find_valid(db, token, purpose).await? else {
        return Ok(None);
    };
    let res = Entity::update_many()
        .col_expr(Column::ConsumedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(Column::Id.eq(found.id))
        .filter(Column::ConsumedAt.is_null())
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    if res.rows_affected == 0 {
        return Ok(None);
    }
    Ok(Some(found.user_id))
}
