//! User request handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use forms_core::models::user::{DepartmentRole, User};
use forms_core::users::{self, CreateUser, UpdateUser, page_bounds};
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::models::{
    CreateUserRequest, ListUsersQuery, MeResponse, MessageResponse, UpdateUserRequest,
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("User {id} not found"))
}

/// `GET /users`: page through active users.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Vec<User>>> {
    let (skip, limit) = page_bounds(query.skip, query.limit);
    Ok(Json(state.users.list(skip, limit).await?))
}

/// `GET /users/admins`: admin only.
pub async fn list_admins_handler(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.list_admins().await?))
}

/// `GET /users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.users.get(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(user))
}

/// `POST /users`: admin only.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = users::create_user(
        state.users.as_ref(),
        CreateUser {
            first_name: body.first_name,
            last_name: body.last_name,
            username: body.username,
            email: body.email,
            password: body.password,
            is_admin: body.is_admin,
        },
    )
    .await?;
    info!(user_id = user.id, by = caller.subject(), "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /users/{id}`: admin only.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let user = users::update_user(
        state.users.as_ref(),
        id,
        UpdateUser {
            first_name: body.first_name,
            last_name: body.last_name,
            username: body.username,
            email: body.email,
            password: body.password,
            is_admin: body.is_admin,
        },
    )
    .await?
    .ok_or_else(|| not_found(id))?;
    info!(user_id = id, by = caller.subject(), "user updated");
    Ok(Json(user))
}

/// `DELETE /users/{id}`: admin only. Soft delete.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.users.soft_delete(id).await? {
        return Err(not_found(id));
    }
    info!(user_id = id, by = caller.subject(), "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{id}/departments-roles`
pub async fn departments_roles_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<DepartmentRole>>> {
    if state.users.get(id).await?.is_none() {
        return Err(not_found(id));
    }
    Ok(Json(state.users.departments_roles(id).await?))
}

/// `GET /users/me`: the caller's own token principal.
pub async fn me_handler(Extension(CurrentUser(principal)): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        message: "User profile".into(),
        display_name: principal.display_name(),
        user: principal,
    })
}

/// `GET /users/public-with-user-info` and `GET /users/from-middleware`:
/// greets signed-in callers by name.
pub async fn public_with_user_info_handler(
    Extension(MaybeUser(principal)): Extension<MaybeUser>,
) -> Json<MessageResponse> {
    let message = match principal {
        Some(p) => format!("Hello, {}!", p.username().unwrap_or("User")),
        None => "Hello, Guest!".to_string(),
    };
    Json(MessageResponse { message })
}
