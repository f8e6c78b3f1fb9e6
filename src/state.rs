//! Application State
//!
//! Shared state handed to every command: configuration, the entity store,
//! the session resolver and the managers built on top of them.

use std::sync::Arc;
use tokio::sync::RwLock;

use taskdeck_core::{Actor, AuditSink, AuthGuard, NoopAuditSink};

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::{
    AuditTrail, DomainCatalog, MembershipService, ProjectService, SearchIndexSynchronizer,
    SqliteAuditSink, TaskService, TaskStatusLifecycleManager,
};
use crate::storage::{ConfigService, Database, UnitOfWork};
use crate::utils::error::{AppError, AppResult};

/// Managers wired to one database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Services {
    pub database: Database,
    pub statuses: TaskStatusLifecycleManager,
    pub projects: ProjectService,
    pub members: MembershipService,
    pub tasks: TaskService,
    /// Reader for the persisted audit trail; `None` when auditing is off
    pub audit_log: Option<SqliteAuditSink>,
}

impl Services {
    /// Build every manager over `database` using `config`
    pub fn build(database: Database, config: &AppConfig) -> Self {
        let audit_log = config
            .audit_enabled
            .then(|| SqliteAuditSink::new(database.clone()));
        let sink: Arc<dyn AuditSink> = match &audit_log {
            Some(sink) => Arc::new(sink.clone()),
            None => Arc::new(NoopAuditSink),
        };
        Self::with_sink(database, config, sink, audit_log)
    }

    /// Build with an explicit audit sink
    pub fn with_sink(
        database: Database,
        config: &AppConfig,
        sink: Arc<dyn AuditSink>,
        audit_log: Option<SqliteAuditSink>,
    ) -> Self {
        let uow = UnitOfWork::new(database.clone());
        let audit = AuditTrail::new(sink);
        let catalog = Arc::new(DomainCatalog::from_config(config));

        Self {
            statuses: TaskStatusLifecycleManager::new(uow.clone(), audit.clone(), catalog.clone()),
            projects: ProjectService::new(uow.clone(), audit.clone(), catalog),
            members: MembershipService::new(uow.clone(), audit.clone()),
            tasks: TaskService::new(uow, audit, config.search.default_limit),
            database,
            audit_log,
        }
    }
}

/// Application state shared by all commands
pub struct AppState {
    /// Session resolver
    auth: Arc<dyn AuthGuard>,
    /// Configuration service for app settings
    config: Arc<RwLock<Option<ConfigService>>>,
    /// Managers over the SQLite store
    services: Arc<RwLock<Option<Services>>>,
    /// Whether the state has been initialized
    initialized: Arc<RwLock<bool>>,
}

impl AppState {
    /// Create a new uninitialized app state
    pub fn new(auth: Arc<dyn AuthGuard>) -> Self {
        Self {
            auth,
            config: Arc::new(RwLock::new(None)),
            services: Arc::new(RwLock::new(None)),
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Initialize from `~/.taskdeck/config.json` and the configured database
    pub async fn initialize(&self) -> AppResult<()> {
        if *self.initialized.read().await {
            return Ok(());
        }
        let config = ConfigService::new()?;
        let database = Database::new(&config.get_config().database)?;
        self.initialize_with(config, database).await
    }

    /// Initialize with an explicit config service and database
    pub async fn initialize_with(&self, config: ConfigService, database: Database) -> AppResult<()> {
        let mut initialized = self.initialized.write().await;
        if *initialized {
            return Ok(());
        }

        let app_config = config.get_config_clone();
        if app_config.search.rebuild_on_start {
            UnitOfWork::new(database.clone()).run(|tx| SearchIndexSynchronizer::rebuild(tx))?;
        }

        {
            let mut services_lock = self.services.write().await;
            *services_lock = Some(Services::build(database, &app_config));
        }

        {
            let mut config_lock = self.config.write().await;
            *config_lock = Some(config);
        }

        tracing::info!(
            "[AppState] initialized (audit_enabled={}, default_statuses={})",
            app_config.audit_enabled,
            app_config.default_statuses.len()
        );
        *initialized = true;
        Ok(())
    }

    /// Install prebuilt services, e.g. with a custom audit sink
    pub async fn initialize_with_services(&self, config: ConfigService, services: Services) {
        let mut initialized = self.initialized.write().await;
        *self.services.write().await = Some(services);
        *self.config.write().await = Some(config);
        *initialized = true;
    }

    /// Resolve a session token to the acting identity
    pub async fn resolve_actor(&self, token: &str) -> AppResult<Actor> {
        Ok(self.auth.resolve(token).await?)
    }

    /// Snapshot of the managers
    pub async fn services(&self) -> AppResult<Services> {
        let guard = self.services.read().await;
        match &*guard {
            Some(services) => Ok(services.clone()),
            None => Err(AppError::internal("Application state not initialized")),
        }
    }

    /// Check if database is healthy
    pub fn is_database_healthy(&self) -> bool {
        // Use try_read to avoid blocking
        if let Ok(guard) = self.services.try_read() {
            if let Some(ref services) = *guard {
                return services.database.is_healthy();
            }
        }
        false
    }

    /// Check if config is healthy
    pub fn is_config_healthy(&self) -> bool {
        if let Ok(guard) = self.config.try_read() {
            if let Some(ref config) = *guard {
                return config.is_healthy();
            }
        }
        false
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> AppResult<AppConfig> {
        let guard = self.config.read().await;
        match &*guard {
            Some(config) => Ok(config.get_config_clone()),
            None => Err(AppError::config("Config service not initialized")),
        }
    }

    /// Update the configuration. Changes to the store or catalog apply on
    /// the next start.
    pub async fn update_config(&self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut guard = self.config.write().await;
        match &mut *guard {
            Some(config) => config.update_config(update),
            None => Err(AppError::config("Config service not initialized")),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("initialized", &self.initialized)
            .finish()
    }
}
