//! Application state - shared across all handlers.

use std::sync::Arc;

use scribe_core::pagination::Pagination;
use scribe_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, MediaStore, PostRepository,
    UserRepository,
};
use scribe_infra::{FsMediaStore, InMemoryMediaStore, InMemoryStore};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub media: Arc<dyn MediaStore>,
    pub pagination: Pagination,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let pagination = Pagination::new(config.page_size);
        let media: Arc<dyn MediaStore> = Arc::new(FsMediaStore::new(config.media_root.clone()));

        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match scribe_infra::connect(db_config).await {
                    Ok(db) => {
                        tracing::info!("Application state initialized (postgres)");
                        return Self {
                            users: Arc::new(scribe_infra::PostgresUserRepository::new(
                                db.clone(),
                            )),
                            groups: Arc::new(scribe_infra::PostgresGroupRepository::new(
                                db.clone(),
                            )),
                            posts: Arc::new(scribe_infra::PostgresPostRepository::new(
                                db.clone(),
                            )),
                            comments: Arc::new(scribe_infra::PostgresCommentRepository::new(
                                db.clone(),
                            )),
                            follows: Arc::new(scribe_infra::PostgresFollowRepository::new(db)),
                            media,
                            pagination,
                        };
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        Self {
            media,
            ..Self::in_memory(pagination)
        }
    }

    /// State backed entirely by the in-memory store; also used by the
    /// handler tests.
    pub fn in_memory(pagination: Pagination) -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(store.users()),
            groups: Arc::new(store.groups()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            follows: Arc::new(store.follows()),
            media: Arc::new(InMemoryMediaStore::new()),
            pagination,
        }
    }
}
