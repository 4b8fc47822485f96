//! User (card holder) CRUD handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::store::{NewUser, UserPage, UserQuery, UserRecord};

use super::super::response::{ApiJson, ApiQuery, ApiResult, Envelope, ok, ok_with_message};
use super::super::state::AppState;

/// GET /api/users?page&limit&search&templateName
pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Json<Envelope<UserPage>> {
    ok(state.store.users.list(&query).await)
}

/// GET /api/users/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<UserRecord>>> {
    Ok(ok(state.store.users.get(&id).await?))
}

/// GET /api/users/name/:name - First user with a field equal to `name`.
pub async fn get_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<UserRecord>>> {
    Ok(ok(state.store.users.get_by_name(&name).await?))
}

/// POST /api/users
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewUser>,
) -> ApiResult<impl IntoResponse> {
    let record = state.store.users.create(new).await?;
    tracing::info!(id = %record.id, name = %record.display_name(), "User created");
    Ok((StatusCode::CREATED, ok_with_message(record, "User data saved")))
}

/// PUT /api/users/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(new): ApiJson<NewUser>,
) -> ApiResult<Json<Envelope<UserRecord>>> {
    let record = state.store.users.update(&id, new).await?;
    tracing::info!(id = %record.id, "User updated");
    Ok(ok_with_message(record, "User data updated"))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<UserRecord>>> {
    let record = state.store.users.delete(&id).await?;
    tracing::info!(id = %record.id, "User deleted");
    Ok(ok_with_message(record, "User deleted"))
}
