//! Bearer-token authentication for protected routes.

use std::sync::Arc;
use tracing::debug;

use super::{AuthPayload, JwtService};
use crate::common::AuthError;
use crate::kernel::BaseIdentityProvider;

/// Resolves a bearer token to an `AuthPayload`.
///
/// Locally signed session tokens are checked first. When provider tokens are
/// accepted, anything else is handed to the identity provider.
#[derive(Clone)]
pub struct AuthGate {
    jwt: Arc<JwtService>,
    identity: Arc<dyn BaseIdentityProvider>,
    accept_provider_tokens: bool,
}

impl AuthGate {
    pub fn new(
        jwt: Arc<JwtService>,
        identity: Arc<dyn BaseIdentityProvider>,
        accept_provider_tokens: bool,
    ) -> Self {
        Self {
            jwt,
            identity,
            accept_provider_tokens,
        }
    }

    /// Pull the token out of an `Authorization` header value.
    pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
        let header = header.ok_or(AuthError::AuthenticationRequired)?;
        let (scheme, token) = header
            .trim()
            .split_once(' ')
            .ok_or(AuthError::MalformedHeader)?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::MalformedHeader);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MalformedHeader);
        }
        Ok(token)
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthPayload, AuthError> {
        let payload = match self.jwt.verify_token(token) {
            Ok(claims) => claims.into_payload(),
            Err(err) if self.accept_provider_tokens => {
                debug!(error = %err, "Not a session token, asking identity provider");
                self.identity.resolve_user(token).await?.into()
            }
            Err(err) => {
                debug!(error = %err, "Session token rejected");
                return Err(AuthError::InvalidToken);
            }
        };

        payload.ensure_valid_username()
    }

    /// Header-to-payload in one step.
    pub async fn authenticate_header(&self, header: Option<&str>) -> Result<AuthPayload, AuthError> {
        let token = Self::bearer_token(header)?;
        self.authenticate(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{provider_user, MockIdentityProvider};

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(
            "gate_secret",
            "checkin-server".to_string(),
            chrono::Duration::hours(1),
        ))
    }

    fn payload(username: &str) -> AuthPayload {
        AuthPayload {
            user_id: "sub-1".to_string(),
            username: username.to_string(),
            name: None,
            email: None,
            roles: vec![],
        }
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(AuthGate::bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(AuthGate::bearer_token(Some("bearer   abc ")).unwrap(), "abc");
        assert!(matches!(
            AuthGate::bearer_token(None),
            Err(AuthError::AuthenticationRequired)
        ));
        assert!(matches!(
            AuthGate::bearer_token(Some("abc")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            AuthGate::bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            AuthGate::bearer_token(Some("Bearer ")),
            Err(AuthError::MalformedHeader)
        ));
    }

    #[tokio::test]
    async fn accepts_session_token() {
        let jwt = jwt();
        let gate = AuthGate::new(jwt.clone(), Arc::new(MockIdentityProvider::new()), false);
        let token = jwt.create_token(&payload("1234")).unwrap();

        let user = gate.authenticate(&token).await.unwrap();
        assert_eq!(user.username, "1234");
    }

    #[tokio::test]
    async fn session_token_with_bad_username_is_rejected() {
        let jwt = jwt();
        let gate = AuthGate::new(jwt.clone(), Arc::new(MockIdentityProvider::new()), false);
        let token = jwt.create_token(&payload("12345")).unwrap();

        assert!(matches!(
            gate.authenticate(&token).await,
            Err(AuthError::InvalidUsername)
        ));
    }

    #[tokio::test]
    async fn provider_token_fallback() {
        let provider = MockIdentityProvider::new()
            .with_access_token("kc-token", provider_user("0042", &["admin"]))
            .with_access_token("kc-bad", provider_user("maria", &[]));
        let gate = AuthGate::new(jwt(), Arc::new(provider), true);

        let user = gate.authenticate("kc-token").await.unwrap();
        assert_eq!(user.username, "0042");
        assert!(user.has_role("admin"));

        assert!(matches!(
            gate.authenticate("kc-bad").await,
            Err(AuthError::InvalidUsername)
        ));
        assert!(matches!(
            gate.authenticate("unknown").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn provider_tokens_ignored_when_disabled() {
        let provider = MockIdentityProvider::new()
            .with_access_token("kc-token", provider_user("0042", &[]));
        let gate = AuthGate::new(jwt(), Arc::new(provider), false);

        assert!(matches!(
            gate.authenticate("kc-token").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
