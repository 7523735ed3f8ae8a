use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::common::AuthError;
use crate::kernel::ProviderUser;

lazy_static! {
    static ref STAFF_USERNAME: Regex = Regex::new(r"^[0-9]{4}$").expect("static regex");
}

/// Staff usernames are exactly four ASCII digits.
pub fn is_valid_username(username: &str) -> bool {
    STAFF_USERNAME.is_match(username)
}

/// The authenticated staff member behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user_id: String,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl AuthPayload {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Identifier stamped on check-in log entries: email when known,
    /// username otherwise.
    pub fn staff_identifier(&self) -> &str {
        match self.email.as_deref() {
            Some(email) if !email.trim().is_empty() => email,
            _ => &self.username,
        }
    }

    /// Enforce the local username policy on top of whatever the token proved.
    pub fn ensure_valid_username(self) -> Result<Self, AuthError> {
        if is_valid_username(&self.username) {
            Ok(self)
        } else {
            tracing::warn!(username = %self.username, "Rejected username outside 4-digit format");
            Err(AuthError::InvalidUsername)
        }
    }
}

impl From<ProviderUser> for AuthPayload {
    fn from(user: ProviderUser) -> Self {
        Self {
            user_id: user.sub,
            username: user.username,
            name: user.name,
            email: user.email,
            roles: user.roles,
        }
    }
}
