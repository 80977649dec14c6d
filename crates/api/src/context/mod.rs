//! Application context - dependency injection container

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use moneymon_common::PkceSessionStore;
use moneymon_core::user::ports::UserRepository;
use moneymon_core::{AccountResolver, OAuthOrchestrator, SessionIssuer, SessionSigner};
use moneymon_core::auth::RedirectPolicy;
use moneymon_domain::{Config, MoneymonError, Result};
use moneymon_infra::{
    build_registry, DbManager, HttpClient, JwtSessionSigner, SessionSweeper, SqliteUserRepository,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub orchestrator: Arc<OAuthOrchestrator>,
    sweeper: Mutex<SessionSweeper>,
}

impl AppContext {
    /// Wire the production graph from `config`: database, providers,
    /// signer, session store and orchestrator.
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid, the database
    /// cannot be opened or migrated, or no provider is configured.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let db =
            Arc::new(open_database(Path::new(&config.database.path), config.database.pool_size)?);

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .build()?;
        let registry = build_registry(&config, &http);
        if registry.is_empty() {
            return Err(MoneymonError::Config(
                "no identity provider configured; set client id and secret for at least one".into(),
            ));
        }

        let repository: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(Arc::clone(&db)));
        let signer: Arc<dyn SessionSigner> =
            Arc::new(JwtSessionSigner::new(config.session.jwt_secret.as_bytes())?);

        let orchestrator = OAuthOrchestrator::new(
            registry,
            Arc::new(PkceSessionStore::new(Duration::from_secs(config.pkce.session_ttl_seconds))),
            AccountResolver::new(
                repository,
                Duration::from_secs(config.http.storage_timeout_seconds),
            ),
            SessionIssuer::new(signer, config.session_ttl()),
            RedirectPolicy::new(
                &config.server.frontend_url,
                config.server.allowed_mobile_redirects.clone(),
            )?,
        );

        info!(providers = ?orchestrator.enabled_providers(), "application context ready");
        Ok(Self::from_parts(config, db, Arc::new(orchestrator)))
    }

    /// Assemble a context from prebuilt parts.
    pub fn from_parts(
        config: Config,
        db: Arc<DbManager>,
        orchestrator: Arc<OAuthOrchestrator>,
    ) -> Self {
        let sweeper = SessionSweeper::new(
            Arc::clone(orchestrator.sessions()),
            Duration::from_secs(config.pkce.sweep_interval_seconds),
        );
        Self { config, db, orchestrator, sweeper: Mutex::new(sweeper) }
    }

    /// Start background housekeeping.
    ///
    /// # Errors
    /// Returns an error if the sweeper is already running.
    pub async fn start_background_tasks(&self) -> Result<()> {
        self.sweeper.lock().await.start().await
    }

    /// Stop background housekeeping; failures are logged, not returned.
    pub async fn shutdown(&self) {
        let mut sweeper = self.sweeper.lock().await;
        if sweeper.is_running().await {
            if let Err(e) = sweeper.stop().await {
                warn!(error = %e, "session sweeper did not stop cleanly");
            }
        }
    }

    /// Database reachability for `/health`.
    pub async fn health_check(&self) -> Result<()> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || db.health_check())
            .await
            .map_err(|e| MoneymonError::Internal(format!("health check task failed: {e}")))?
    }
}

fn open_database(path: &Path, pool_size: u32) -> Result<DbManager> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            MoneymonError::Config(format!(
                "cannot create database directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let db = DbManager::new(path, pool_size)?;
    db.run_migrations()?;
    info!(path = %path.display(), "database ready");
    Ok(db)
}
