//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container and one migration run per test binary; each test
//! gets its own pool and a router wired to a mock identity provider.

use anyhow::{Context, Result};
use axum::Router;
use server_core::domains::auth::{AuthPayload, JwtService};
use server_core::kernel::{provider_user, BaseIdentityProvider, MockIdentityProvider, ServerDeps};
use server_core::server::{build_router, AppState};
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use super::ApiClient;

pub const ADMIN_ROLE: &str = "admin";
pub const STAFF_PASSWORD: &str = "festa-2024";

struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Per-test context.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let api = ctx.api_as("1234");
/// }
/// ```
pub struct TestHarness {
    /// Database pool - use this for fixtures.
    pub db_pool: PgPool,
    /// Identity provider behind the router. Accounts `1234` (staff) and
    /// `9999` (admin) accept `STAFF_PASSWORD`.
    pub identity: MockIdentityProvider,
    pub jwt: Arc<JwtService>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Database pool is automatically dropped
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        let identity = MockIdentityProvider::new()
            .with_account(STAFF_PASSWORD, provider_user("1234", &[]))
            .with_account(STAFF_PASSWORD, provider_user("9999", &[ADMIN_ROLE]));

        let jwt = Arc::new(JwtService::new(
            "integration-test-secret",
            "checkin-tests".to_string(),
            chrono::Duration::hours(1),
        ));

        Ok(Self {
            db_pool,
            identity,
            jwt,
        })
    }

    pub fn router(&self) -> Router {
        let identity: Arc<dyn BaseIdentityProvider> = Arc::new(self.identity.clone());
        let deps = ServerDeps::new(
            self.db_pool.clone(),
            identity,
            self.jwt.clone(),
            ADMIN_ROLE.to_string(),
            false,
        );
        build_router(AppState::new(deps), &[]).expect("router builds without CORS origins")
    }

    /// Session token for a staff member, minted directly.
    pub fn token_for(&self, username: &str, roles: &[&str]) -> String {
        let payload = AuthPayload::from(provider_user(username, roles));
        self.jwt
            .create_token(&payload)
            .expect("token signs with test secret")
    }

    /// Client without credentials.
    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.router(), None)
    }

    /// Client authenticated as a regular staff member.
    pub fn api_as(&self, username: &str) -> ApiClient {
        ApiClient::new(self.router(), Some(self.token_for(username, &[])))
    }

    /// Client authenticated as an administrator.
    pub fn admin_api(&self) -> ApiClient {
        ApiClient::new(self.router(), Some(self.token_for("9999", &[ADMIN_ROLE])))
    }
}
