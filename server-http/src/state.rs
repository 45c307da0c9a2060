use shared::config::Config;
use std::path::Path;
use std::sync::Arc;
use turnstile::auth::{
    AuthError, InMemoryUserRepository, SessionStore, SledUserRepository, UserRepository,
    UserService,
};

/// Server state shared by the route handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub session_store: Arc<SessionStore>,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        session_store: Arc<SessionStore>,
        config: &Config,
    ) -> Self {
        Self {
            user_service,
            session_store,
            body_limit: config.body_limit_bytes,
        }
    }

    /// Wire the user and session stores described by `config`
    pub fn from_config(config: &Config) -> Self {
        let user_repo: Arc<dyn UserRepository> = match &config.data_dir {
            // Try to initialize with persistence, fall back to in-memory if it fails
            Some(data_dir) => match Self::init_with_persistence(data_dir) {
                Ok(repo) => {
                    tracing::info!("User store initialized with persistence enabled");
                    repo
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to initialize persistence: {}. Running in-memory mode.",
                        e
                    );
                    Arc::new(InMemoryUserRepository::new())
                }
            },
            None => {
                tracing::info!("No data directory configured, keeping users in memory");
                Arc::new(InMemoryUserRepository::new())
            }
        };

        let session_store = SessionStore::new(config.session_ttl(), config.max_sessions);

        Self::new(
            Arc::new(UserService::new(user_repo)),
            Arc::new(session_store),
            config,
        )
    }

    fn init_with_persistence(data_dir: &Path) -> Result<Arc<dyn UserRepository>, AuthError> {
        let base_path = data_dir.join(".turnstile");

        std::fs::create_dir_all(&base_path).map_err(|e| {
            AuthError::StorageError(format!("cannot create {}: {}", base_path.display(), e))
        })?;

        let repo = SledUserRepository::new(base_path.join("users.sled"))?;
        Ok(Arc::new(repo))
    }
}
