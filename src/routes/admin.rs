use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::middleware::{bearer_auth, require_admin},
    domain::{PublicUser, UserStatus},
    error::AuthError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    status: UserStatus,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admin/users/{id}/status", patch(change_status))
        .route("/admin/users/{id}", delete(delete_user))
        .route(
            "/admin/users/{id}/roles/{role}",
            post(add_role).delete(remove_role),
        )
        .layer(from_fn(require_admin))
        .layer(from_fn_with_state(state.clone(), bearer_auth))
        .with_state(state)
}

async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangeStatusRequest>,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.users.change_status(id, body.status).await?;
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AuthError> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_role(
    State(state): State<Arc<AppState>>,
    Path((id, role)): Path<(Uuid, String)>,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.users.add_role(id, &role).await?;
    Ok(Json(user))
}

async fn remove_role(
    State(state): State<Arc<AppState>>,
    Path((id, role)): Path<(Uuid, String)>,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.users.remove_role(id, &role).await?;
    Ok(Json(user))
}
