use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use serde_json::json;
use tower::Service;
use uuid::Uuid;

use server::routes::{self, ServerState};

fn cors() -> tower_http::cors::CorsLayer {
    tower_http::cors::CorsLayer::very_permissive()
}

async fn build_app() -> anyhow::Result<(Router, DatabaseConnection)> {
    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await {
        let msg = format!("{}", e);
        if msg.contains("duplicate key value violates unique constraint") {
            eprintln!("migrations already applied, continue: {}", msg);
        } else {
            return Err(e.into());
        }
    }
    let state = ServerState {
        db: db.clone(),
        auth: configs::AuthConfig { jwt_secret: "test-secret".into(), ..Default::default() },
    };
    Ok((routes::build_router(cors(), state), db))
}

async fn json_body(resp: axum::response::Response) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn post_json(uri: &str, body: &serde_json::Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

fn hash_password(password: &str) -> String {
    use argon2::password_hash::{PasswordHasher, SaltString};
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    argon2::Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("argon2 hash")
        .to_string()
}

/// Seeds an admin profile directly (the HTTP bootstrap is one-shot per
/// database) and logs in through /admin/login to get a session token.
async fn admin_token(app: &Router, db: &DatabaseConnection) -> anyhow::Result<String> {
    let email = format!("admin_{}@example.com", Uuid::new_v4().simple());
    let password = "AdminPass123!";
    let user = models::profile::create(db, &email, "Admin", models::profile::ROLE_ADMIN, true).await?;
    models::user_credentials::upsert_password(db, user.id, hash_password(password), "argon2").await?;

    let req = post_json("/admin/login", &json!({"email": email, "password": password}))?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    Ok(body["token"].as_str().expect("admin token").to_string())
}

async fn user_token(app: &Router) -> anyhow::Result<String> {
    let email = format!("buyer_{}@example.com", Uuid::new_v4().simple());
    let req = post_json(
        "/auth/register",
        &json!({"email": email, "fullName": "Buyer", "password": "BuyerPass123"}),
    )?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    Ok(body["token"].as_str().expect("session token").to_string())
}

/// Creates a sweet through the admin API; the name embeds `tag` so tests
/// can find it again via the search filter.
async fn create_sweet(
    app: &Router,
    admin: &str,
    tag: &str,
    price: &str,
    stock: i32,
) -> anyhow::Result<serde_json::Value> {
    let mut req = post_json(
        "/sweets",
        &json!({
            "name": format!("Fudge {}", tag),
            "description": "Soft chocolate fudge",
            "price": price,
            "category": "chocolate",
            "stock": stock
        }),
    )?;
    req.headers_mut().insert("authorization", format!("Bearer {}", admin).parse()?);
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await
}

async fn find_by_tag(app: &Router, tag: &str) -> anyhow::Result<Vec<serde_json::Value>> {
    let req = Request::builder()
        .method("GET")
        .uri(format!("/sweets?search={}", tag))
        .body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    Ok(body.as_array().expect("listing array").clone())
}

#[tokio::test]
async fn test_catalog_search_is_case_insensitive() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, db) = build_app().await?;
    let admin = admin_token(&app, &db).await?;

    let tag = Uuid::new_v4().simple().to_string();
    create_sweet(&app, &admin, &tag, "3.25", 10).await?;

    // Uppercased needle still matches; category=all is a no-op filter.
    let found = find_by_tag(&app, &tag.to_uppercase()).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["category"], "chocolate");

    let req = Request::builder()
        .method("GET")
        .uri(format!("/sweets?search={}&category=all", tag))
        .body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/sweets?search={}&category=candy", tag))
        .body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    let body = json_body(resp).await?;
    assert!(body.as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_admin_crud_flow() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, db) = build_app().await?;
    let admin = admin_token(&app, &db).await?;

    let tag = Uuid::new_v4().simple().to_string();
    let created = create_sweet(&app, &admin, &tag, "4.50", 5).await?;
    let id = created["id"].as_str().expect("id").to_string();

    // Full replace via PUT
    let mut req = Request::builder()
        .method("PUT")
        .uri(format!("/sweets/{}", id))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", admin))
        .body(Body::from(serde_json::to_vec(&json!({
            "name": format!("Fudge {}", tag),
            "description": "Now with sea salt",
            "price": "5.25",
            "category": "chocolate",
            "stock": 7
        }))?))?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["price"], "5.25");
    assert_eq!(body["stock"], 7);

    // Single-product fetch is public and reflects the update
    req = Request::builder()
        .method("GET")
        .uri(format!("/sweets/{}", id))
        .body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["description"], "Now with sea salt");

    // Delete, then the listing no longer carries it
    req = Request::builder()
        .method("DELETE")
        .uri(format!("/sweets/{}", id))
        .header("authorization", format!("Bearer {}", admin))
        .body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(find_by_tag(&app, &tag).await?.is_empty());

    req = Request::builder()
        .method("GET")
        .uri(format!("/sweets/{}", id))
        .body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Deleting again is a 404
    req = Request::builder()
        .method("DELETE")
        .uri(format!("/sweets/{}", id))
        .header("authorization", format!("Bearer {}", admin))
        .body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_purchase_decrements_stock_and_reports_total() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, db) = build_app().await?;
    let admin = admin_token(&app, &db).await?;
    let buyer = user_token(&app).await?;

    let tag = Uuid::new_v4().simple().to_string();
    let created = create_sweet(&app, &admin, &tag, "5.00", 3).await?;
    let id = created["id"].as_str().unwrap().to_string();

    let mut req = post_json(&format!("/sweets/{}/purchase", id), &json!({"quantity": 2}))?;
    req.headers_mut().insert("authorization", format!("Bearer {}", buyer).parse()?);
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["totalPrice"], "10.00");

    let found = find_by_tag(&app, &tag).await?;
    assert_eq!(found[0]["stock"], 1);
    Ok(())
}

#[tokio::test]
async fn test_purchase_defaults_to_one_unit() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, db) = build_app().await?;
    let admin = admin_token(&app, &db).await?;
    let buyer = user_token(&app).await?;

    let tag = Uuid::new_v4().simple().to_string();
    let created = create_sweet(&app, &admin, &tag, "2.50", 2).await?;
    let id = created["id"].as_str().unwrap().to_string();

    // No body at all: quantity defaults to 1.
    let req = Request::builder()
        .method("POST")
        .uri(format!("/sweets/{}/purchase", id))
        .header("authorization", format!("Bearer {}", buyer))
        .body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["totalPrice"], "2.50");

    let found = find_by_tag(&app, &tag).await?;
    assert_eq!(found[0]["stock"], 1);
    Ok(())
}

#[tokio::test]
async fn test_purchase_insufficient_stock_changes_nothing() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, db) = build_app().await?;
    let admin = admin_token(&app, &db).await?;
    let buyer = user_token(&app).await?;

    let tag = Uuid::new_v4().simple().to_string();
    let created = create_sweet(&app, &admin, &tag, "5.00", 1).await?;
    let id = created["id"].as_str().unwrap().to_string();

    let mut req = post_json(&format!("/sweets/{}/purchase", id), &json!({"quantity": 5}))?;
    req.headers_mut().insert("authorization", format!("Bearer {}", buyer).parse()?);
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await?;
    assert_eq!(body["error"], "Not enough stock");

    // Nothing was written.
    let found = find_by_tag(&app, &tag).await?;
    assert_eq!(found[0]["stock"], 1);
    Ok(())
}

#[tokio::test]
async fn test_purchase_requires_session() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, _db) = build_app().await?;

    let req = post_json(&format!("/sweets/{}/purchase", Uuid::new_v4()), &json!({"quantity": 1}))?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_purchase_unknown_sweet_is_not_found() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, _db) = build_app().await?;
    let buyer = user_token(&app).await?;

    let mut req = post_json(&format!("/sweets/{}/purchase", Uuid::new_v4()), &json!({"quantity": 1}))?;
    req.headers_mut().insert("authorization", format!("Bearer {}", buyer).parse()?);
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_restock_requires_admin() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, db) = build_app().await?;
    let admin = admin_token(&app, &db).await?;
    let buyer = user_token(&app).await?;

    let tag = Uuid::new_v4().simple().to_string();
    let created = create_sweet(&app, &admin, &tag, "1.00", 2).await?;
    let id = created["id"].as_str().unwrap().to_string();

    // A plain user holds a valid session but not the role.
    let mut req = post_json(&format!("/sweets/{}/restock", id), &json!({"quantity": 4}))?;
    req.headers_mut().insert("authorization", format!("Bearer {}", buyer).parse()?);
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = json_body(resp).await?;
    assert_eq!(body["error"], "Admin access required");

    // The admin can top up stock.
    let mut req = post_json(&format!("/sweets/{}/restock", id), &json!({"quantity": 4}))?;
    req.headers_mut().insert("authorization", format!("Bearer {}", admin).parse()?);
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["stock"], 6);

    // Zero or negative restock quantities are rejected.
    let mut req = post_json(&format!("/sweets/{}/restock", id), &json!({"quantity": 0}))?;
    req.headers_mut().insert("authorization", format!("Bearer {}", admin).parse()?);
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_create_sweet_requires_admin() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let (app, _db) = build_app().await?;
    let buyer = user_token(&app).await?;

    let mut req = post_json(
        "/sweets",
        &json!({"name": "Nope", "description": "", "price": "1.00", "category": "candy"}),
    )?;
    req.headers_mut().insert("authorization", format!("Bearer {}", buyer).parse()?);
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    Ok(())
}
