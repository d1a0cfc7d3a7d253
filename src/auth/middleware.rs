use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use axum::Json;

use super::AccessClaims;
use crate::{
    domain::ADMIN_ROLE,
    error::{AuthError, ErrorBody},
    state::AppState,
};

/// Bearer-token middleware: verifies the access token and stashes its
/// claims in request extensions for handlers and role gates downstream.
pub async fn bearer_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken.into_response())?;

    let claims = state
        .tokens
        .verify_access_token(token)
        .map_err(IntoResponse::into_response)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, Response> {
    let claims = req
        .extensions()
        .get::<AccessClaims>()
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "No claims in request".into(),
                }),
            )
                .into_response()
        })?;

    if !claims.roles.iter().any(|r| r == ADMIN_ROLE) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorBody {
                error: "Missing required role".into(),
            }),
        )
            .into_response());
    }

    Ok(next.run(req).await)
}
