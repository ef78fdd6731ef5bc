/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    db,
    error::WisperResult,
    fanout::{ConnectionRegistry, Notifier},
    ledger::LedgerStore,
    notify::NotificationLog,
    rate_limit::RateLimiter,
    votes::VoteEngine,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub ledger: LedgerStore,
    pub votes: VoteEngine,
    pub notifications: NotificationLog,
    pub connections: ConnectionRegistry,
    pub notifier: Notifier,
    pub rate_limiter: RateLimiter,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> WisperResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize ledger database
        let db =
            db::create_pool(&config.storage.ledger_db, db::DatabaseOptions::default()).await?;

        // Run migrations
        db::run_migrations(&db).await?;

        // Test connection
        db::test_connection(&db).await?;

        // Initialize core services
        let ledger = LedgerStore::new(db.clone());
        let votes = VoteEngine::new(db.clone());
        let notifications = NotificationLog::new(db.clone());

        // Connection registry is process-local runtime state; it starts
        // empty and is populated by the push channel endpoint
        let connections = ConnectionRegistry::new();
        let notifier = Notifier::new(notifications.clone(), connections.clone());

        // Initialize rate limiter
        let rate_limiter = RateLimiter::new(&config.rate_limit);

        Ok(Self {
            config: Arc::new(config),
            db,
            ledger,
            votes,
            notifications,
            connections,
            notifier,
            rate_limiter,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> WisperResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
