use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AccessClaims, middleware::bearer_auth},
    domain::PublicUser,
    error::AuthError,
    services::token_service::ClientMeta,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    identifier: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogoutRequest {
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: &'static str,
    expires_in: usize,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    tokens: TokenResponse,
    user: PublicUser,
}

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(me))
        .layer(from_fn_with_state(state.clone(), bearer_auth))
        .with_state(state.clone());

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .with_state(state)
        .merge(protected)
}

fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    ClientMeta {
        ip_address: header_str(header::HeaderName::from_static("x-forwarded-for")),
        user_agent: header_str(header::USER_AGENT),
    }
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let user = state
        .auth
        .register(&body.username, &body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let outcome = state
        .auth
        .login(&body.identifier, &body.password, &client_meta(&headers))
        .await?;

    Ok(Json(LoginResponse {
        tokens: TokenResponse {
            access_token: outcome.tokens.access_token,
            refresh_token: outcome.tokens.refresh_token,
            token_type: "Bearer",
            expires_in: state.tokens.access_ttl_secs(),
        },
        user: outcome.user,
    }))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let pair = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer",
        expires_in: state.tokens.access_ttl_secs(),
    }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    body: Option<Json<LogoutRequest>>,
) -> StatusCode {
    let token = body.and_then(|Json(b)| b.refresh_token);
    state.auth.logout(token.as_deref()).await;
    StatusCode::NO_CONTENT
}

async fn me(claims: AccessClaims) -> Json<AccessClaims> {
    Json(claims)
}
