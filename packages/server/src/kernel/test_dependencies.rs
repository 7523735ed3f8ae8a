// Mock implementations for testing
//
// MockIdentityProvider stands in for Keycloak: accounts are registered up
// front, grants mint opaque random tokens, and logout calls are recorded.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{BaseIdentityProvider, ProviderTokens, ProviderUser};
use crate::common::AuthError;

/// Build a provider identity for tests.
pub fn provider_user(username: &str, roles: &[&str]) -> ProviderUser {
    ProviderUser {
        sub: Uuid::new_v4().to_string(),
        username: username.to_string(),
        name: Some(format!("Staff {}", username)),
        email: Some(format!("{}@example.org", username)),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    accounts: Arc<Mutex<HashMap<String, (String, ProviderUser)>>>,
    access_tokens: Arc<Mutex<HashMap<String, ProviderUser>>>,
    refresh_tokens: Arc<Mutex<HashMap<String, ProviderUser>>>,
    logout_calls: Arc<Mutex<Vec<String>>>,
    unavailable: bool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account usable with the password grant.
    pub fn with_account(self, password: &str, user: ProviderUser) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(user.username.clone(), (password.to_string(), user));
        self
    }

    /// Register a provider access token that resolves to `user`.
    pub fn with_access_token(self, token: &str, user: ProviderUser) -> Self {
        self.access_tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), user);
        self
    }

    /// Every call fails as if the provider were unreachable.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn logout_calls(&self) -> Vec<String> {
        self.logout_calls.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable {
            return Err(AuthError::ProviderUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }

    fn issue(&self, user: ProviderUser) -> ProviderTokens {
        let access_token = format!("access-{}", Uuid::new_v4());
        let refresh_token = format!("refresh-{}", Uuid::new_v4());

        self.access_tokens
            .lock()
            .unwrap()
            .insert(access_token.clone(), user.clone());
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh_token.clone(), user);

        ProviderTokens {
            access_token,
            refresh_token: Some(refresh_token),
            expires_in: 300,
        }
    }
}

#[async_trait]
impl BaseIdentityProvider for MockIdentityProvider {
    async fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ProviderTokens, AuthError> {
        self.check_available()?;

        let user = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(username) {
                Some((expected, user)) if expected == password => user.clone(),
                _ => {
                    return Err(AuthError::CredentialsRejected(
                        "Invalid user credentials".to_string(),
                    ))
                }
            }
        };

        Ok(self.issue(user))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderTokens, AuthError> {
        self.check_available()?;

        // Refresh tokens rotate: the presented one is consumed.
        let user = self
            .refresh_tokens
            .lock()
            .unwrap()
            .remove(refresh_token)
            .ok_or(AuthError::InvalidToken)?;

        Ok(self.issue(user))
    }

    async fn resolve_user(&self, access_token: &str) -> Result<ProviderUser, AuthError> {
        self.check_available()?;

        self.access_tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.check_available()?;

        self.logout_calls
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        self.refresh_tokens.lock().unwrap().remove(refresh_token);
        Ok(())
    }
}
