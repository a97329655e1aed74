use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Group, Post, User};
use crate::error::RepoError;
use crate::pagination::PageWindow;

/// Generic repository trait defining standard operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the entity's delete policy.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User directory access.
///
/// `delete` applies the user-deletion policy: the user's posts, the comments
/// on those posts, the comments they authored and their follow relations (on
/// either side) go with them, atomically.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Group repository.
///
/// `delete` applies the group-deletion policy: referencing posts survive with
/// their group reference cleared.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;
}

/// Post repository. Every listing projects through the default ordering:
/// `created_at` descending.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn count_all(&self) -> Result<u64, RepoError>;
    async fn list_recent(&self, window: PageWindow) -> Result<Vec<Post>, RepoError>;

    async fn count_by_group(&self, group_id: Uuid) -> Result<u64, RepoError>;
    async fn list_by_group(
        &self,
        group_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError>;

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
    async fn list_by_author(
        &self,
        author_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError>;

    /// Posts authored by anyone the given user follows.
    async fn count_feed(&self, user_id: Uuid) -> Result<u64, RepoError>;
    async fn list_feed(
        &self,
        user_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError>;

    /// Rewrite a post's text, group and image. `author_id` and `created_at`
    /// are never touched by this operation.
    async fn update_content(
        &self,
        post_id: Uuid,
        text: String,
        group_id: Option<Uuid>,
        image: Option<String>,
    ) -> Result<Post, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, newest first.
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    async fn count_by_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

/// Follow repository. Rows are created and deleted wholesale; there is no
/// update operation.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Get-or-create the `(user, author)` relation. Returns whether a new
    /// row was created; re-following is a no-op.
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Delete the relation if present; no-op when absent.
    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<(), RepoError>;

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;
}
