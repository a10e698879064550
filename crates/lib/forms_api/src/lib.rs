//! # forms_api
//!
//! HTTP API library for Forms Anyware.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use forms_core::auth::queries::PgStore;
use forms_core::auth::store::CredentialStore;
use forms_core::users::UserRepository;
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential lookups for login.
    pub credentials: Arc<dyn CredentialStore>,
    /// User management storage.
    pub users: Arc<dyn UserRepository>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// State backed by a PostgreSQL pool.
    pub fn from_pool(pool: PgPool, config: ApiConfig) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            credentials: store.clone(),
            users: store,
            config,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `forms_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    forms_core::migrate::migrate(pool).await
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() && config.environment.is_development() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/healthz", get(health::health))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh-token", post(auth::refresh_handler));

    // Public routes that personalise the response for signed-in callers
    let personalised = Router::new()
        .route(
            "/users/public-with-user-info",
            get(users::public_with_user_info_handler),
        )
        .route(
            "/users/from-middleware",
            get(users::public_with_user_info_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_user,
        ));

    // Protected routes (require a valid token)
    let protected = Router::new()
        .route("/users", get(users::list_users_handler))
        .route("/users/me", get(users::me_handler))
        .route("/users/{id}", get(users::get_user_handler))
        .route(
            "/users/{id}/departments-roles",
            get(users::departments_roles_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user,
        ));

    // Admin routes (require an admin claim on either token kind)
    let admin = Router::new()
        .route("/auth/debug-token", get(auth::debug_token_handler))
        .route("/users/admins", get(users::list_admins_handler))
        .route("/users", post(users::create_user_handler))
        .route(
            "/users/{id}",
            axum::routing::put(users::update_user_handler).delete(users::delete_user_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .merge(public)
        .merge(personalised)
        .merge(protected)
        .merge(admin)
        .layer(cors)
        .with_state(state)
}
