// Minimal client for the Keycloak OpenID Connect endpoints used by the
// check-in server: resource-owner password grant, refresh, userinfo,
// introspection and logout.

pub mod models;

use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

pub use crate::models::{ErrorResponse, Introspection, RealmAccess, TokenResponse, UserInfo};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid identity provider url: {0}")]
    InvalidUrl(String),

    #[error("request to identity provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider answered {status}: {description}")]
    Rejected {
        status: u16,
        code: Option<String>,
        description: String,
    },

    #[error("token is not active")]
    InactiveToken,
}

impl Error {
    /// True when the provider refused the credentials or token (a 4xx
    /// answer or an inactive token). Server errors and transport failures
    /// are not rejections.
    pub fn is_rejection(&self) -> bool {
        match self {
            Error::Rejected { status, .. } => (400..500).contains(status),
            Error::InactiveToken => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeycloakOptions {
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KeycloakService {
    options: KeycloakOptions,
    client: Client,
}

impl KeycloakService {
    pub fn new(options: KeycloakOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// `{base}/realms/{realm}/protocol/openid-connect/{path}` with the realm
    /// percent-encoded (realm names may contain spaces).
    pub fn endpoint(&self, path: &[&str]) -> Result<Url, Error> {
        let mut url = Url::parse(&self.options.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.options.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.options.base_url.clone()))?
            .pop_if_empty()
            .extend(["realms", self.options.realm.as_str(), "protocol", "openid-connect"])
            .extend(path);

        Ok(url)
    }

    fn client_form<'a>(&'a self, mut form: Vec<(&'a str, &'a str)>) -> Vec<(&'a str, &'a str)> {
        form.push(("client_id", self.options.client_id.as_str()));
        if let Some(secret) = self.options.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }
        form
    }

    /// Resource-owner password grant.
    pub async fn password_grant(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, Error> {
        let form = self.client_form(vec![
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", "openid profile email"),
        ]);

        let response = self
            .client
            .post(self.endpoint(&["token"])?)
            .form(&form)
            .send()
            .await?;

        parse_json(response).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        let form = self.client_form(vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ]);

        let response = self
            .client
            .post(self.endpoint(&["token"])?)
            .form(&form)
            .send()
            .await?;

        parse_json(response).await
    }

    pub async fn userinfo(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .client
            .get(self.endpoint(&["userinfo"])?)
            .bearer_auth(access_token)
            .send()
            .await?;

        parse_json(response).await
    }

    /// Introspect a token; inactive tokens are reported as `Error::InactiveToken`.
    pub async fn introspect(&self, token: &str) -> Result<Introspection, Error> {
        let form = self.client_form(vec![("token", token)]);

        let response = self
            .client
            .post(self.endpoint(&["token", "introspect"])?)
            .form(&form)
            .send()
            .await?;

        let introspection: Introspection = parse_json(response).await?;
        if !introspection.active {
            return Err(Error::InactiveToken);
        }
        Ok(introspection)
    }

    /// End the provider session bound to `refresh_token`.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), Error> {
        let form = self.client_form(vec![("refresh_token", refresh_token)]);

        let response = self
            .client
            .post(self.endpoint(&["logout"])?)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(rejection(status, response).await)
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();
    if !status.is_success() {
        return Err(rejection(status, response).await);
    }
    Ok(response.json::<T>().await?)
}

async fn rejection(status: StatusCode, response: reqwest::Response) -> Error {
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorResponse>(&body).ok();

    let code = parsed.as_ref().and_then(|e| e.error.clone());
    let description = parsed
        .and_then(|e| e.error_description)
        .or_else(|| code.clone())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    Error::Rejected {
        status: status.as_u16(),
        code,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base_url: &str) -> KeycloakService {
        KeycloakService::new(KeycloakOptions {
            base_url: base_url.to_string(),
            realm: "Festa Julina".to_string(),
            client_id: "checkin".to_string(),
            client_secret: Some("secret".to_string()),
        })
    }

    #[test]
    fn endpoint_encodes_realm() {
        let url = service("https://login.example.org").endpoint(&["token"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.example.org/realms/Festa%20Julina/protocol/openid-connect/token"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let url = service("https://example.org/auth/")
            .endpoint(&["token", "introspect"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.org/auth/realms/Festa%20Julina/protocol/openid-connect/token/introspect"
        );
    }

    #[test]
    fn endpoint_rejects_garbage_base() {
        let result = service("not a url").endpoint(&["token"]);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn client_form_appends_credentials() {
        let svc = service("https://example.org");
        let form = svc.client_form(vec![("grant_type", "password")]);
        assert_eq!(
            form,
            vec![
                ("grant_type", "password"),
                ("client_id", "checkin"),
                ("client_secret", "secret"),
            ]
        );
    }

    #[test]
    fn userinfo_roles_default_to_empty() {
        let info: UserInfo = serde_json::from_str(
            r#"{"sub":"abc","preferred_username":"1234","email":"a@b.c"}"#,
        )
        .unwrap();
        assert!(info.roles().is_empty());

        let info: UserInfo = serde_json::from_str(
            r#"{"sub":"abc","preferred_username":"1234","realm_access":{"roles":["admin"]}}"#,
        )
        .unwrap();
        assert_eq!(info.roles(), vec!["admin".to_string()]);
    }

    #[test]
    fn rejection_flag() {
        let answered = |status| Error::Rejected {
            status,
            code: None,
            description: "x".into(),
        };
        assert!(Error::InactiveToken.is_rejection());
        assert!(answered(401).is_rejection());
        assert!(answered(400).is_rejection());
        assert!(!answered(500).is_rejection());
        assert!(!answered(503).is_rejection());
        assert!(!Error::InvalidUrl("x".into()).is_rejection());
    }
}
