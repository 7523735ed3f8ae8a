use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::common::{Actor, ApiError, Capability};
use crate::domains::auth::{
    session, AuthPayload, ExchangeRequest, LoginRequest, LogoutRequest, RefreshRequest,
    SessionGrant,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub user: AuthPayload,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub message: String,
    pub user: AuthPayload,
}

pub async fn login_handler(
    Extension(state): Extension<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionGrant>, ApiError> {
    let Json(request) = body?;
    let grant = session::login(
        state.deps.identity.as_ref(),
        &state.deps.jwt_service,
        request,
    )
    .await?;
    Ok(Json(grant))
}

pub async fn exchange_handler(
    Extension(state): Extension<AppState>,
    body: Result<Json<ExchangeRequest>, JsonRejection>,
) -> Result<Json<SessionGrant>, ApiError> {
    let Json(request) = body?;
    let grant = session::exchange(
        state.deps.identity.as_ref(),
        &state.deps.jwt_service,
        request,
    )
    .await?;
    Ok(Json(grant))
}

pub async fn refresh_handler(
    Extension(state): Extension<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<SessionGrant>, ApiError> {
    let Json(request) = body?;
    let grant = session::refresh(
        state.deps.identity.as_ref(),
        &state.deps.jwt_service,
        request,
    )
    .await?;
    Ok(Json(grant))
}

pub async fn logout_handler(
    Extension(state): Extension<AppState>,
    body: Result<Json<LogoutRequest>, JsonRejection>,
) -> StatusCode {
    // An unreadable body still logs out locally
    let request = body
        .map(|Json(request)| request)
        .unwrap_or(LogoutRequest { refresh_token: None });
    session::logout(state.deps.identity.as_ref(), request).await;
    StatusCode::NO_CONTENT
}

pub async fn profile_handler(AuthUser(user): AuthUser) -> Json<AuthPayload> {
    Json(user)
}

pub async fn validate_handler(AuthUser(user): AuthUser) -> Json<ValidateResponse> {
    Json(ValidateResponse { valid: true, user })
}

pub async fn admin_only_handler(
    Extension(state): Extension<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AdminResponse>, ApiError> {
    Actor::new(&user.username, &user.roles)
        .can(Capability::AccessAdminArea)
        .check(state.deps.as_ref())?;

    Ok(Json(AdminResponse {
        message: "This route is restricted to administrators".to_string(),
        user,
    }))
}
