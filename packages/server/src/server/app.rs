//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use keycloak::{KeycloakOptions, KeycloakService};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::auth::{AuthGate, JwtService};
use crate::kernel::{BaseIdentityProvider, KeycloakAdapter, ServerDeps};
use crate::server::middleware::{extract_client_ip, require_auth};
use crate::server::routes::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
    pub gate: Arc<AuthGate>,
}

impl AppState {
    pub fn new(deps: ServerDeps) -> Self {
        let gate = Arc::new(AuthGate::new(
            deps.jwt_service.clone(),
            deps.identity.clone(),
            deps.accept_provider_tokens,
        ));
        Self {
            db_pool: deps.db_pool.clone(),
            deps: Arc::new(deps),
            gate,
        }
    }
}

/// Wire the Keycloak-backed dependencies from configuration
pub fn build_deps(config: &Config, pool: PgPool) -> ServerDeps {
    let keycloak = Arc::new(KeycloakService::new(KeycloakOptions {
        base_url: config.keycloak_url.clone(),
        realm: config.keycloak_realm.clone(),
        client_id: config.keycloak_client_id.clone(),
        client_secret: config.keycloak_client_secret.clone(),
    }));
    let identity: Arc<dyn BaseIdentityProvider> =
        Arc::new(KeycloakAdapter::new(keycloak, config.token_validation));

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt_secret,
        config.jwt_issuer.clone(),
        config.session_ttl(),
    ));

    ServerDeps::new(
        pool,
        identity,
        jwt_service,
        config.admin_role.clone(),
        config.accept_provider_tokens,
    )
}

/// Build the Axum application router from configuration
pub fn build_app(config: &Config, pool: PgPool) -> Result<Router> {
    let state = AppState::new(build_deps(config, pool));
    build_router(state, &config.allowed_origins)
}

/// Build the router around already-wired state
///
/// Public routes: health and the session endpoints. Everything else sits
/// behind `require_auth`.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let gate = state.gate.clone();

    let protected = Router::new()
        // Auth
        .route("/auth/profile", get(profile_handler))
        .route("/auth/validate", get(validate_handler))
        .route("/auth/admin-only", get(admin_only_handler))
        // Participants
        .route(
            "/participants",
            post(create_participant_handler).get(list_participants_handler),
        )
        .route("/participants/search", get(unified_search_handler))
        .route("/participants/search/:query", get(classified_search_handler))
        .route("/participants/cpf/:cpf", get(get_by_cpf_handler))
        .route("/participants/ra/:ra", get(get_by_ra_handler))
        .route("/participants/rf/:rf", get(get_by_rf_handler))
        .route("/participants/name/:name", get(search_by_name_handler))
        .route(
            "/participants/:id",
            get(get_participant_handler)
                .patch(update_participant_handler)
                .delete(delete_participant_handler),
        )
        // Tickets
        .route(
            "/tickets",
            post(create_ticket_handler).get(list_tickets_handler),
        )
        .route(
            "/tickets/participant/:participant_id",
            get(participant_tickets_handler),
        )
        .route(
            "/tickets/:id",
            get(get_ticket_handler)
                .patch(update_ticket_handler)
                .delete(delete_ticket_handler),
        )
        .route("/tickets/:id/checkin", patch(check_in_ticket_handler))
        // Check-ins
        .route("/checkins/:participant_id", post(record_checkin_handler))
        .route(
            "/checkins/participant/:participant_id",
            get(participant_checkins_handler),
        )
        .route(
            "/checkins/status/:participant_id",
            get(checkin_status_handler),
        )
        .route_layer(middleware::from_fn(move |req, next| {
            require_auth(gate.clone(), req, next)
        }));

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/exchange", post(exchange_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/logout", post(logout_handler))
        .merge(protected)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(extract_client_ip))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
