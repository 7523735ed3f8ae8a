// Trait definitions for dependency injection
//
// INFRASTRUCTURE traits only. Session issuing and the username policy live in
// the auth domain and are written against these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::AuthError;

/// Tokens issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

/// Identity asserted by the provider for an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub sub: String,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

// =============================================================================
// Identity Provider Trait (OAuth2 / OpenID Connect)
// =============================================================================

#[async_trait]
pub trait BaseIdentityProvider: Send + Sync {
    /// Resource-owner password grant.
    async fn password_grant(&self, username: &str, password: &str)
        -> Result<ProviderTokens, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderTokens, AuthError>;

    /// Resolve the user behind a provider access token.
    async fn resolve_user(&self, access_token: &str) -> Result<ProviderUser, AuthError>;

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;
}
