//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::PostRepository;
use quill_core::services::PostService;
use quill_infra::{DatabaseConfig, InMemoryPostRepository};

#[cfg(feature = "postgres")]
use quill_infra::{DatabaseConnections, PostgresPostRepository};

/// Backing store the post service writes to.
#[derive(Clone)]
pub enum Storage {
    Memory,
    #[cfg(feature = "postgres")]
    Postgres(Arc<DatabaseConnections>),
}

impl Storage {
    pub fn name(&self) -> &'static str {
        match self {
            Storage::Memory => "memory",
            #[cfg(feature = "postgres")]
            Storage::Postgres(_) => "postgres",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub storage: Storage,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        let (storage, repo) = Self::connect(db_config).await;
        tracing::info!(storage = storage.name(), "Application state initialized");

        Self {
            posts: PostService::new(repo),
            storage,
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self {
            posts: PostService::new(Arc::new(InMemoryPostRepository::new())),
            storage: Storage::Memory,
        }
    }

    #[cfg(feature = "postgres")]
    async fn connect(db_config: Option<&DatabaseConfig>) -> (Storage, Arc<dyn PostRepository>) {
        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return (Storage::Memory, Arc::new(InMemoryPostRepository::new()));
        };

        match DatabaseConnections::init(config).await {
            Ok(connections) => {
                let repo: Arc<dyn PostRepository> =
                    Arc::new(PostgresPostRepository::new(connections.main.clone()));
                (Storage::Postgres(Arc::new(connections)), repo)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                (Storage::Memory, Arc::new(InMemoryPostRepository::new()))
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect(db_config: Option<&DatabaseConfig>) -> (Storage, Arc<dyn PostRepository>) {
        if db_config.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
        }
        tracing::info!("Running without postgres feature - using in-memory repository");
        (Storage::Memory, Arc::new(InMemoryPostRepository::new()))
    }
}
