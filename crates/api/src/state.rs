use {crate::middleware::RateLimiter, std::sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<router::SmartRouter>,
    pub pools: repository::pools::PoolRepository,
    pub auth: Arc<auth::AuthService>,
    pub hub: hub::Hub,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

/// `/health`'s notion of "alive": the database pool still answers.
pub struct Liveness {
    db: sqlx::PgPool,
}

impl Liveness {
    pub fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl observe::metrics::LivenessChecking for Liveness {
    async fn is_alive(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }
}
