//! Server dependencies shared by the request handlers.
//!
//! External services sit behind trait objects so tests can swap in mocks.

use async_trait::async_trait;
use keycloak::KeycloakService;
use sqlx::PgPool;
use std::sync::Arc;

use crate::common::auth::{AuthError, HasAuthContext};
use crate::domains::auth::JwtService;
use crate::kernel::{BaseIdentityProvider, ProviderTokens, ProviderUser};

// =============================================================================
// KeycloakService Adapter (implements BaseIdentityProvider trait)
// =============================================================================

/// How provider access tokens are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidation {
    /// Call the userinfo endpoint with the token itself.
    Userinfo,
    /// RFC 7662 introspection with the client credentials.
    Introspection,
}

impl std::str::FromStr for TokenValidation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "userinfo" => Ok(TokenValidation::Userinfo),
            "introspection" | "introspect" => Ok(TokenValidation::Introspection),
            other => Err(format!("unknown token validation mode '{}'", other)),
        }
    }
}

/// Wrapper around KeycloakService that implements BaseIdentityProvider
pub struct KeycloakAdapter {
    service: Arc<KeycloakService>,
    validation: TokenValidation,
}

impl KeycloakAdapter {
    pub fn new(service: Arc<KeycloakService>, validation: TokenValidation) -> Self {
        Self {
            service,
            validation,
        }
    }
}

/// Only 4xx answers blame the caller; provider 5xx and transport failures
/// surface as unavailability.
fn grant_error(err: keycloak::Error) -> AuthError {
    match err {
        keycloak::Error::Rejected {
            status,
            description,
            ..
        } if (400..500).contains(&status) => AuthError::CredentialsRejected(description),
        keycloak::Error::InactiveToken => AuthError::InvalidToken,
        other => AuthError::ProviderUnavailable(other.to_string()),
    }
}

fn token_error(err: keycloak::Error) -> AuthError {
    if err.is_rejection() {
        tracing::debug!(error = %err, "Provider rejected access token");
        AuthError::InvalidToken
    } else {
        AuthError::ProviderUnavailable(err.to_string())
    }
}

fn tokens(response: keycloak::TokenResponse) -> ProviderTokens {
    ProviderTokens {
        access_token: response.access_token,
        refresh_token: response.refresh_token,
        expires_in: response.expires_in,
    }
}

#[async_trait]
impl BaseIdentityProvider for KeycloakAdapter {
    async fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ProviderTokens, AuthError> {
        self.service
            .password_grant(username, password)
            .await
            .map(tokens)
            .map_err(grant_error)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderTokens, AuthError> {
        self.service
            .refresh(refresh_token)
            .await
            .map(tokens)
            .map_err(|err| match grant_error(err) {
                AuthError::CredentialsRejected(_) => AuthError::InvalidToken,
                other => other,
            })
    }

    async fn resolve_user(&self, access_token: &str) -> Result<ProviderUser, AuthError> {
        match self.validation {
            TokenValidation::Userinfo => {
                let info = self
                    .service
                    .userinfo(access_token)
                    .await
                    .map_err(token_error)?;
                let roles = info.roles();
                Ok(ProviderUser {
                    sub: info.sub,
                    username: info.preferred_username,
                    name: info.name,
                    email: info.email,
                    roles,
                })
            }
            TokenValidation::Introspection => {
                let found = self
                    .service
                    .introspect(access_token)
                    .await
                    .map_err(token_error)?;
                let username = found
                    .preferred_username
                    .or(found.username)
                    .ok_or(AuthError::InvalidToken)?;
                let sub = found.sub.ok_or(AuthError::InvalidToken)?;
                Ok(ProviderUser {
                    sub,
                    username,
                    name: found.name,
                    email: found.email,
                    roles: found.realm_access.map(|a| a.roles).unwrap_or_default(),
                })
            }
        }
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.service.logout(refresh_token).await.map_err(grant_error)
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub identity: Arc<dyn BaseIdentityProvider>,
    pub jwt_service: Arc<JwtService>,
    /// Role that grants admin capabilities
    pub admin_role: String,
    /// Accept provider access tokens on protected routes, not only session tokens
    pub accept_provider_tokens: bool,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        identity: Arc<dyn BaseIdentityProvider>,
        jwt_service: Arc<JwtService>,
        admin_role: String,
        accept_provider_tokens: bool,
    ) -> Self {
        Self {
            db_pool,
            identity,
            jwt_service,
            admin_role,
            accept_provider_tokens,
        }
    }
}

impl HasAuthContext for ServerDeps {
    fn admin_role(&self) -> &str {
        &self.admin_role
    }
}
