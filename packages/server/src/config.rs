use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::kernel::TokenValidation;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub session_ttl_hours: i64,
    pub keycloak_url: String,
    pub keycloak_realm: String,
    pub keycloak_client_id: String,
    pub keycloak_client_secret: Option<String>,
    pub allowed_origins: Vec<String>,
    pub admin_role: String,
    pub accept_provider_tokens: bool,
    pub token_validation: TokenValidation,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("{} must be set", key));
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: or_default("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            port: or_default("PORT", "3001")
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_issuer: or_default("JWT_ISSUER", "checkin-server"),
            session_ttl_hours: or_default("SESSION_TTL_HOURS", "8")
                .parse()
                .context("SESSION_TTL_HOURS must be a valid number")?,
            keycloak_url: required("KEYCLOAK_URL")?,
            keycloak_realm: required("KEYCLOAK_REALM")?,
            keycloak_client_id: required("KEYCLOAK_CLIENT_ID")?,
            keycloak_client_secret: var("KEYCLOAK_CLIENT_SECRET").filter(|s| !s.is_empty()),
            allowed_origins: or_default("ALLOWED_ORIGINS", "http://localhost:3000")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            admin_role: or_default("ADMIN_ROLE", "admin"),
            accept_provider_tokens: parse_bool(&or_default("ACCEPT_PROVIDER_TOKENS", "true"))
                .context("ACCEPT_PROVIDER_TOKENS must be true or false")?,
            token_validation: or_default("TOKEN_VALIDATION", "userinfo")
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("TOKEN_VALIDATION must be userinfo or introspection")?,
        })
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("invalid boolean '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/checkin"),
        ("JWT_SECRET", "secret"),
        ("KEYCLOAK_URL", "http://localhost:8080"),
        ("KEYCLOAK_REALM", "festa"),
        ("KEYCLOAK_CLIENT_ID", "checkin"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.jwt_issuer, "checkin-server");
        assert_eq!(config.session_ttl(), chrono::Duration::hours(8));
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000".to_string()]);
        assert_eq!(config.admin_role, "admin");
        assert!(config.accept_provider_tokens);
        assert_eq!(config.token_validation, TokenValidation::Userinfo);
        assert_eq!(config.keycloak_client_secret, None);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "9000"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("ACCEPT_PROVIDER_TOKENS", "false"),
            ("TOKEN_VALIDATION", "introspection"),
            ("KEYCLOAK_CLIENT_SECRET", "shh"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(!config.accept_provider_tokens);
        assert_eq!(config.token_validation, TokenValidation::Introspection);
        assert_eq!(config.keycloak_client_secret.as_deref(), Some("shh"));
    }

    #[test]
    fn missing_required_is_an_error() {
        let err = Config::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn bad_numbers_are_errors() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}
