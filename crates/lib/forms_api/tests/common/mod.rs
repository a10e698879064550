//! In-memory stores and request helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use forms_api::config::{ApiConfig, Environment};
use forms_api::{AppState, router};
use forms_core::auth::AuthError;
use forms_core::auth::store::CredentialStore;
use forms_core::models::auth::CredentialRecord;
use forms_core::models::user::{DepartmentRole, NewUser, User, UserChanges};
use forms_core::settings::AuthSettings;
use forms_core::users::{UserError, UserRepository};
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

#[derive(Debug, Clone)]
struct Row {
    id: i64,
    first_name: String,
    last_name: String,
    username: Option<String>,
    email: String,
    password_hash: String,
    is_admin: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Row {
    fn user(&self) -> User {
        User {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Users held in memory; implements both store traits.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Row>>,
    pub login_writes: Mutex<u32>,
    pub assignments: Mutex<Vec<(i64, DepartmentRole)>>,
}

impl MemoryStore {
    /// Adds a user whose password is hashed at a low bcrypt cost.
    pub fn seed(&self, email: &str, password: &str, username: &str, is_admin: bool) -> i64 {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        let now = Utc::now();
        rows.push(Row {
            id,
            first_name: "First".into(),
            last_name: "Last".into(),
            username: Some(username.into()),
            email: email.into(),
            password_hash: bcrypt::hash(password, 4).unwrap(),
            is_admin,
            last_login: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        id
    }

    pub fn password_hash(&self, id: i64) -> String {
        let rows = self.rows.lock().unwrap();
        rows.iter().find(|r| r.id == id).unwrap().password_hash.clone()
    }

    pub fn is_deleted(&self, id: i64) -> bool {
        let rows = self.rows.lock().unwrap();
        rows.iter().find(|r| r.id == id).unwrap().deleted_at.is_some()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_active_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.email == email && r.deleted_at.is_none())
            .map(|r| CredentialRecord {
                id: r.id,
                email: r.email.clone(),
                first_name: r.first_name.clone(),
                last_name: r.last_name.clone(),
                username: r.username.clone(),
                password_hash: r.password_hash.clone(),
                is_admin: r.is_admin,
                last_login: r.last_login,
                deleted_at: r.deleted_at,
            }))
    }

    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AuthError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == user_id) {
            row.last_login = Some(at);
        }
        *self.login_writes.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>, UserError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.deleted_at.is_none())
            .skip(skip as usize)
            .take(limit as usize)
            .map(Row::user)
            .collect())
    }

    async fn list_admins(&self) -> Result<Vec<User>, UserError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.deleted_at.is_none() && r.is_admin)
            .map(Row::user)
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<User>, UserError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .map(Row::user))
    }

    async fn find_id_by_email(&self, email: &str) -> Result<Option<i64>, UserError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.email == email).map(|r| r.id))
    }

    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let row = Row {
            id: rows.len() as i64 + 1,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            last_login: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = row.user();
        rows.push(row);
        Ok(created)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, UserError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
        else {
            return Ok(None);
        };
        if let Some(v) = changes.first_name {
            row.first_name = v;
        }
        if let Some(v) = changes.last_name {
            row.last_name = v;
        }
        if let Some(v) = changes.username {
            row.username = Some(v);
        }
        if let Some(v) = changes.email {
            row.email = v;
        }
        if let Some(v) = changes.password_hash {
            row.password_hash = v;
        }
        if let Some(v) = changes.is_admin {
            row.is_admin = v;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.user()))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, UserError> {
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
        {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn departments_roles(&self, user_id: i64) -> Result<Vec<DepartmentRole>, UserError> {
        let assignments = self.assignments.lock().unwrap();
        Ok(assignments
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, dr)| dr.clone())
            .collect())
    }
}

pub fn config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        cors_origins: vec!["http://localhost:3000".into()],
        environment: Environment::Testing,
        auth: AuthSettings::with_secret(SECRET),
    }
}

pub fn app(store: Arc<MemoryStore>) -> Router {
    router(AppState {
        credentials: store.clone(),
        users: store,
        config: config(),
    })
}

pub async fn send(app: &Router, request: Request<Body>) -> (Response<Body>, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (Response::from_parts(parts, Body::empty()), json)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Logs in and returns the parsed token response.
pub async fn login(app: &Router, email: &str, password: &str) -> serde_json::Value {
    let (response, json) = send(
        app,
        form_post(
            "/auth/login",
            &format!("username={}&password={password}", email.replace('@', "%40")),
        ),
    )
    .await;
    assert_eq!(response.status(), 200, "login failed: {json}");
    json
}
