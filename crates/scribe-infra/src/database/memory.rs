//! In-memory repositories - used as fallback when no database is configured
//! and by the handler test-suite.
//!
//! All repository handles share one table set behind an async RwLock, so the
//! delete policies can reach across entities the same way the transactional
//! Postgres ones do. Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use scribe_core::domain::{Comment, Follow, Group, Post, User};
use scribe_core::error::RepoError;
use scribe_core::pagination::PageWindow;
use scribe_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostRepository,
    UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: HashMap<Uuid, Group>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    follows: HashMap<(Uuid, Uuid), Follow>,
}

type Shared = Arc<RwLock<Tables>>;

/// The shared in-memory store; hands out repository handles over one table
/// set.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Shared,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn groups(&self) -> InMemoryGroupRepository {
        InMemoryGroupRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn follows(&self) -> InMemoryFollowRepository {
        InMemoryFollowRepository {
            tables: self.tables.clone(),
        }
    }
}

fn windowed(mut posts: Vec<Post>, window: PageWindow) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
        .into_iter()
        .skip(window.offset as usize)
        .take(window.limit as usize)
        .collect()
}

#[derive(Clone)]
pub struct InMemoryUserRepository {
    tables: Shared,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn save(&self, entity: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.username == entity.username && u.id != entity.id)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let owned_posts: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();

        tables
            .comments
            .retain(|_, c| c.author_id != id && !owned_posts.contains(&c.post_id));
        tables.posts.retain(|_, p| p.author_id != id);
        tables
            .follows
            .retain(|_, f| f.user_id != id && f.author_id != id);

        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[derive(Clone)]
pub struct InMemoryGroupRepository {
    tables: Shared,
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn save(&self, entity: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .values()
            .any(|g| g.slug == entity.slug && g.id != entity.id)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.groups.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        // Posts survive with their group reference cleared.
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .groups
            .values()
            .find(|g| g.slug == slug)
            .cloned())
    }
}

#[derive(Clone)]
pub struct InMemoryPostRepository {
    tables: Shared,
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.posts.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn count_all(&self) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.posts.len() as u64)
    }

    async fn list_recent(&self, window: PageWindow) -> Result<Vec<Post>, RepoError> {
        let posts: Vec<Post> = self.tables.read().await.posts.values().cloned().collect();
        Ok(windowed(posts, window))
    }

    async fn count_by_group(&self, group_id: Uuid) -> Result<u64, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.group_id == Some(group_id))
            .count() as u64)
    }

    async fn list_by_group(
        &self,
        group_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError> {
        let posts: Vec<Post> = self
            .tables
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.group_id == Some(group_id))
            .cloned()
            .collect();
        Ok(windowed(posts, window))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .count() as u64)
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError> {
        let posts: Vec<Post> = self
            .tables
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        Ok(windowed(posts, window))
    }

    async fn count_feed(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        let followed: Vec<Uuid> = tables
            .follows
            .values()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.author_id)
            .collect();
        Ok(tables
            .posts
            .values()
            .filter(|p| followed.contains(&p.author_id))
            .count() as u64)
    }

    async fn list_feed(
        &self,
        user_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let followed: Vec<Uuid> = tables
            .follows
            .values()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.author_id)
            .collect();
        let posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| followed.contains(&p.author_id))
            .cloned()
            .collect();
        drop(tables);
        Ok(windowed(posts, window))
    }

    async fn update_content(
        &self,
        post_id: Uuid,
        text: String,
        group_id: Option<Uuid>,
        image: Option<String>,
    ) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        let post = tables.posts.get_mut(&post_id).ok_or(RepoError::NotFound)?;
        post.text = text;
        post.group_id = group_id;
        post.image = image;
        Ok(post.clone())
    }
}

#[derive(Clone)]
pub struct InMemoryCommentRepository {
    tables: Shared,
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, entity: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        tables.comments.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.comments.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let mut comments: Vec<Comment> = self
            .tables
            .read()
            .await
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn count_by_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .count() as u64)
    }
}

#[derive(Clone)]
pub struct InMemoryFollowRepository {
    tables: Shared,
}

#[async_trait]
impl FollowRepository for InMemoryFollowRepository {
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.follows.contains_key(&(user_id, author_id)) {
            return Ok(false);
        }
        tables
            .follows
            .insert((user_id, author_id), Follow::new(user_id, author_id));
        Ok(true)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .follows
            .remove(&(user_id, author_id));
        Ok(())
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .follows
            .contains_key(&(user_id, author_id)))
    }
}
