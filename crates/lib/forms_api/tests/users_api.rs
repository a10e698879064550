//! Integration tests: user management endpoints and their access policies.

mod common;

use std::sync::Arc;

use common::{MemoryStore, app, get, json_request, login, send};
use forms_core::models::user::DepartmentRole;

struct Fixture {
    store: Arc<MemoryStore>,
    app: axum::Router,
    user_token: String,
    admin_token: String,
    user_id: i64,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::default());
    let user_id = store.seed("user@example.com", "secret", "first.last", false);
    store.seed("admin@example.com", "admin-pass", "the.admin", true);
    let app = app(store.clone());

    let user_token = login(&app, "user@example.com", "secret").await["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let admin_token = login(&app, "admin@example.com", "admin-pass").await["id_token"]
        .as_str()
        .unwrap()
        .to_string();

    Fixture {
        store,
        app,
        user_token,
        admin_token,
        user_id,
    }
}

#[tokio::test]
async fn reads_require_a_user() {
    let f = fixture().await;

    let (response, _) = send(&f.app, get("/users", None)).await;
    assert_eq!(response.status(), 401);

    let (response, body) = send(&f.app, get("/users", Some(&f.user_token))).await;
    assert_eq!(response.status(), 200);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert!(body[0].get("password").is_none());
    assert!(body[0].get("password_hash").is_none());

    let (response, body) = send(&f.app, get("/users?skip=1&limit=5", Some(&f.user_token))).await;
    assert_eq!(response.status(), 200);
    assert_eq!(body[0]["email"], "admin@example.com");

    let uri = format!("/users/{}", f.user_id);
    let (response, body) = send(&f.app, get(&uri, Some(&f.user_token))).await;
    assert_eq!(response.status(), 200);
    assert_eq!(body["username"], "first.last");

    let (response, _) = send(&f.app, get("/users/999", Some(&f.user_token))).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn admin_listing_is_admin_only() {
    let f = fixture().await;

    let (response, _) = send(&f.app, get("/users/admins", Some(&f.user_token))).await;
    assert_eq!(response.status(), 403);

    let (response, body) = send(&f.app, get("/users/admins", Some(&f.admin_token))).await;
    assert_eq!(response.status(), 200);
    let admins = body.as_array().unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0]["email"], "admin@example.com");
}

#[tokio::test]
async fn admin_creates_user_with_hashed_password() {
    let f = fixture().await;
    let new_user = serde_json::json!({
        "first_name": "New",
        "last_name": "Person",
        "email": "new@example.com",
        "password": "correct-horse",
    });

    let (response, _) = send(
        &f.app,
        json_request("POST", "/users", Some(&f.user_token), new_user.clone()),
    )
    .await;
    assert_eq!(response.status(), 403);

    let (response, body) = send(
        &f.app,
        json_request("POST", "/users", Some(&f.admin_token), new_user.clone()),
    )
    .await;
    assert_eq!(response.status(), 201);
    assert_eq!(body["is_admin"], false);
    let id = body["id"].as_i64().unwrap();

    let hash = f.store.password_hash(id);
    assert_ne!(hash, "correct-horse");
    assert!(bcrypt::verify("correct-horse", &hash).unwrap());

    // The new account can log in straight away.
    login(&f.app, "new@example.com", "correct-horse").await;

    let (response, body) = send(
        &f.app,
        json_request("POST", "/users", Some(&f.admin_token), new_user),
    )
    .await;
    assert_eq!(response.status(), 400);
    assert_eq!(body["message"], "Email already registered");
}

#[tokio::test]
async fn create_rejects_short_passwords() {
    let f = fixture().await;
    let (response, body) = send(
        &f.app,
        json_request(
            "POST",
            "/users",
            Some(&f.admin_token),
            serde_json::json!({
                "first_name": "New",
                "last_name": "Person",
                "email": "short@example.com",
                "password": "short",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), 400);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn admin_updates_user() {
    let f = fixture().await;
    let uri = format!("/users/{}", f.user_id);

    let (response, _) = send(
        &f.app,
        json_request(
            "PUT",
            &uri,
            Some(&f.user_token),
            serde_json::json!({ "first_name": "Nope" }),
        ),
    )
    .await;
    assert_eq!(response.status(), 403);

    let (response, body) = send(
        &f.app,
        json_request(
            "PUT",
            &uri,
            Some(&f.admin_token),
            serde_json::json!({ "first_name": "Renamed", "is_sys_admin": true }),
        ),
    )
    .await;
    assert_eq!(response.status(), 200);
    assert_eq!(body["first_name"], "Renamed");
    assert_eq!(body["last_name"], "Last");
    assert_eq!(body["is_admin"], true);

    let (response, body) = send(
        &f.app,
        json_request(
            "PUT",
            &uri,
            Some(&f.admin_token),
            serde_json::json!({ "email": "admin@example.com" }),
        ),
    )
    .await;
    assert_eq!(response.status(), 400);
    assert_eq!(body["message"], "Email already registered");

    let (response, _) = send(
        &f.app,
        json_request(
            "PUT",
            "/users/999",
            Some(&f.admin_token),
            serde_json::json!({ "first_name": "Ghost" }),
        ),
    )
    .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn soft_deleted_user_cannot_log_in() {
    let f = fixture().await;
    let uri = format!("/users/{}", f.user_id);
    let delete = || {
        axum::http::Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header("authorization", format!("Bearer {}", f.admin_token))
            .body(axum::body::Body::empty())
            .unwrap()
    };

    let (response, _) = send(&f.app, delete()).await;
    assert_eq!(response.status(), 204);
    assert!(f.store.is_deleted(f.user_id));

    let (response, _) = send(&f.app, delete()).await;
    assert_eq!(response.status(), 404);

    let (response, _) = send(
        &f.app,
        common::form_post("/auth/login", "username=user%40example.com&password=secret"),
    )
    .await;
    assert_eq!(response.status(), 401);

    let (response, _) = send(&f.app, get(&uri, Some(&f.admin_token))).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn departments_roles_for_user() {
    let f = fixture().await;
    f.store.assignments.lock().unwrap().push((
        f.user_id,
        DepartmentRole {
            department_id: 4,
            department_name: "Finance".into(),
            department_code: "FIN".into(),
            role_id: 5,
            role_name: "MANAGER".into(),
        },
    ));

    let uri = format!("/users/{}/departments-roles", f.user_id);
    let (response, body) = send(&f.app, get(&uri, Some(&f.user_token))).await;
    assert_eq!(response.status(), 200);
    assert_eq!(body[0]["department_code"], "FIN");
    assert_eq!(body[0]["role_name"], "MANAGER");

    let (response, _) = send(&f.app, get("/users/999/departments-roles", Some(&f.user_token))).await;
    assert_eq!(response.status(), 404);
}
