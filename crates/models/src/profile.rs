use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub email_confirmed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Credentials,
    Purchases,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Credentials => Entity::has_one(crate::user_credentials::Entity).into(),
            Relation::Purchases => Entity::has_many(crate::purchase::Entity).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    if !email.contains('@') {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_full_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("full name required".into()));
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<(), errors::ModelError> {
    if role != ROLE_USER && role != ROLE_ADMIN {
        return Err(errors::ModelError::Validation(format!("unknown role: {role}")));
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    email: &str,
    full_name: &str,
    role: &str,
    confirmed: bool,
) -> Result<Model, errors::ModelError> {
    validate_email(email)?;
    validate_full_name(full_name)?;
    validate_role(role)?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set(full_name.to_string()),
        role: Set(role.to_string()),
        email_confirmed_at: Set(confirmed.then_some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// True if any admin profile exists. Used by the bootstrap guard.
pub async fn admin_exists(db: &DatabaseConnection) -> Result<bool, errors::ModelError> {
    let found = Entity::find()
        .filter(Column::Role.eq(ROLE_ADMIN))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(found.is_some())
}

pub async fn mark_email_confirmed(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Model, errors::ModelError> {
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?
        .ok_or_else(|| errors::ModelError::Validation("profile not found".into()))?
        .into();
    let now: DateTimeWithTimeZone = Utc::now().into();
    am.email_confirmed_at = Set(Some(now));
    am.updated_at = Set(now);
    am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
