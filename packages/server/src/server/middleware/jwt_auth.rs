use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::ClientIp;
use crate::common::{ApiError, AuthError};
use crate::domains::auth::{AuthGate, AuthPayload};

/// Authenticated staff member, placed in request extensions by `require_auth`
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthPayload);

/// Bearer authentication middleware for protected routes
///
/// Resolves the Authorization header through the gate and adds AuthUser to
/// request extensions. Requests without a valid token stop here with 401.
pub async fn require_auth(gate: Arc<AuthGate>, mut request: Request, next: Next) -> Response {
    // Owned copy: the request must not stay borrowed across the await
    let header = request.headers().get(AUTHORIZATION).map(|value| {
        value
            .to_str()
            .map(str::to_owned)
            .map_err(|_| AuthError::MalformedHeader)
    });

    let result = match header {
        Some(Err(err)) => Err(err),
        Some(Ok(value)) => gate.authenticate_header(Some(&value)).await,
        None => gate.authenticate_header(None).await,
    };

    let client_ip = request.extensions().get::<ClientIp>().map(|ip| ip.0);

    match result {
        Ok(user) => {
            debug!(username = %user.username, ?client_ip, "Authenticated request");
            request.extensions_mut().insert(AuthUser(user));
            next.run(request).await
        }
        Err(err) => {
            warn!(error = %err, ?client_ip, path = %request.uri().path(), "Authentication failed");
            ApiError::from(err).into_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Auth(AuthError::AuthenticationRequired))
    }
}
