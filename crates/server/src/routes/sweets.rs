use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::guard::CurrentUser;
use crate::routes::auth::ServerState;
use models::sweet;
use service::{catalog, inventory};

#[derive(Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[utoipa::path(get, path = "/sweets", tag = "sweets", params(("search" = Option<String>, Query, description = "name substring"), ("category" = Option<String>, Query, description = "category or 'all'")), responses((status = 200, description = "Catalog listing")))]
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<sweet::Model>>, ApiError> {
    let rows = catalog::list_sweets(&state.db, params.search.as_deref(), params.category.as_deref()).await?;
    Ok(Json(rows))
}

#[utoipa::path(get, path = "/sweets/{id}", tag = "sweets", responses((status = 200, description = "Product"), (status = 404, description = "Not Found")))]
pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<sweet::Model>, ApiError> {
    let found = catalog::get_sweet(&state.db, id).await?;
    Ok(Json(found))
}

#[utoipa::path(post, path = "/sweets", tag = "sweets", request_body = crate::openapi::SweetRequest, responses((status = 200, description = "Created"), (status = 403, description = "Admin access required")))]
pub async fn create(
    State(state): State<ServerState>,
    Json(input): Json<inventory::SweetInput>,
) -> Result<Json<sweet::Model>, ApiError> {
    let created = inventory::create_sweet(&state.db, input).await?;
    Ok(Json(created))
}

#[utoipa::path(put, path = "/sweets/{id}", tag = "sweets", request_body = crate::openapi::SweetRequest, responses((status = 200, description = "Updated"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<inventory::SweetInput>,
) -> Result<Json<sweet::Model>, ApiError> {
    let updated = inventory::update_sweet(&state.db, id, input).await?;
    Ok(Json(updated))
}

#[utoipa::path(delete, path = "/sweets/{id}", tag = "sweets", responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    inventory::delete_sweet(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Default)]
pub struct PurchaseBody {
    pub quantity: Option<i32>,
}

#[utoipa::path(post, path = "/sweets/{id}/purchase", tag = "sweets", request_body = crate::openapi::PurchaseRequest, responses((status = 200, description = "Purchased"), (status = 400, description = "Not enough stock"), (status = 404, description = "Not Found")))]
pub async fn purchase(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    body: Option<Json<PurchaseBody>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Missing or empty body means a single unit.
    let quantity = body.and_then(|Json(b)| b.quantity).unwrap_or(1);
    let receipt = inventory::purchase(&state.db, user.id, id, quantity).await?;
    Ok(Json(serde_json::json!({ "success": true, "totalPrice": receipt.total_price })))
}

#[derive(Deserialize)]
pub struct RestockBody {
    pub quantity: i32,
}

#[utoipa::path(post, path = "/sweets/{id}/restock", tag = "sweets", request_body = crate::openapi::RestockRequest, responses((status = 200, description = "Restocked"), (status = 403, description = "Admin access required"), (status = 404, description = "Not Found")))]
pub async fn restock(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RestockBody>,
) -> Result<Json<sweet::Model>, ApiError> {
    let updated = inventory::restock(&state.db, id, body.quantity).await?;
    Ok(Json(updated))
}
