//! In-process HTTP client for driving the router in tests.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;

pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// The `error` code of a standard error body.
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

pub struct ApiClient {
    router: Router,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(router: Router, token: Option<String>) -> Self {
        Self { router, token }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn get(&self, uri: &str) -> ApiResponse {
        self.send(Method::GET, uri, None::<&()>).await
    }

    pub async fn delete(&self, uri: &str) -> ApiResponse {
        self.send(Method::DELETE, uri, None::<&()>).await
    }

    pub async fn post<B: Serialize>(&self, uri: &str, body: &B) -> ApiResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str) -> ApiResponse {
        self.send(Method::POST, uri, None::<&()>).await
    }

    pub async fn patch<B: Serialize>(&self, uri: &str, body: &B) -> ApiResponse {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn patch_empty(&self, uri: &str) -> ApiResponse {
        self.send(Method::PATCH, uri, None::<&()>).await
    }

    /// Send a raw body, for malformed-input cases.
    pub async fn post_raw(&self, uri: &str, body: &str) -> ApiResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.dispatch(request).await
    }

    async fn send<B: Serialize>(&self, method: Method, uri: &str, body: Option<&B>) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> ApiResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        ApiResponse { status, body }
    }
}
