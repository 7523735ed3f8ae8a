//! Login, token exchange, refresh and logout against the identity provider.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{is_valid_username, AuthPayload, JwtService};
use crate::common::AuthError;
use crate::kernel::{BaseIdentityProvider, ProviderTokens};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRequest {
    /// Provider access token obtained by the front end.
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// What a successful login hands back to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGrant {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    /// Provider refresh token; used with `/auth/refresh`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: AuthPayload,
}

fn issue_session(
    jwt: &JwtService,
    user: AuthPayload,
    refresh_token: Option<String>,
) -> Result<SessionGrant, AuthError> {
    let access_token = jwt.create_token(&user)?;
    Ok(SessionGrant {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt.ttl_seconds(),
        refresh_token,
        user,
    })
}

async fn session_from_provider(
    identity: &dyn BaseIdentityProvider,
    jwt: &JwtService,
    tokens: ProviderTokens,
) -> Result<SessionGrant, AuthError> {
    let user: AuthPayload = identity.resolve_user(&tokens.access_token).await?.into();
    let user = user.ensure_valid_username()?;
    issue_session(jwt, user, tokens.refresh_token)
}

/// Password login. The username policy is checked before the provider is
/// contacted so malformed usernames never reach it.
pub async fn login(
    identity: &dyn BaseIdentityProvider,
    jwt: &JwtService,
    request: LoginRequest,
) -> Result<SessionGrant, AuthError> {
    let username = request.username.trim();
    if !is_valid_username(username) {
        return Err(AuthError::InvalidUsername);
    }

    let tokens = identity.password_grant(username, &request.password).await?;
    let grant = session_from_provider(identity, jwt, tokens).await?;

    info!(username = %grant.user.username, "Staff logged in");
    Ok(grant)
}

/// Trade a provider access token for a local session.
pub async fn exchange(
    identity: &dyn BaseIdentityProvider,
    jwt: &JwtService,
    request: ExchangeRequest,
) -> Result<SessionGrant, AuthError> {
    let user: AuthPayload = identity.resolve_user(request.access_token.trim()).await?.into();
    let user = user.ensure_valid_username()?;

    info!(username = %user.username, "Provider token exchanged for session");
    issue_session(jwt, user, request.refresh_token)
}

pub async fn refresh(
    identity: &dyn BaseIdentityProvider,
    jwt: &JwtService,
    request: RefreshRequest,
) -> Result<SessionGrant, AuthError> {
    let tokens = identity.refresh(request.refresh_token.trim()).await?;
    session_from_provider(identity, jwt, tokens).await
}

/// Revoke the provider session. Failures are logged, never surfaced:
/// the client drops its tokens either way.
pub async fn logout(identity: &dyn BaseIdentityProvider, request: LogoutRequest) {
    let Some(refresh_token) = request.refresh_token.filter(|t| !t.trim().is_empty()) else {
        info!("Logout without refresh token");
        return;
    };

    match identity.logout(refresh_token.trim()).await {
        Ok(()) => info!("Provider session revoked"),
        Err(err) => warn!(error = %err, "Provider logout failed"),
    }
}
