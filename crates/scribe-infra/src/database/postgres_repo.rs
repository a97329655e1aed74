//! PostgreSQL repository implementations.
//!
//! Listings always order by `created_at` descending; the delete policies for
//! users and groups run inside transactions so a half-applied policy can
//! never be observed.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, Unchanged,
};
use uuid::Uuid;

use scribe_core::domain::{Comment, Follow, Group, Post, User};
use scribe_core::error::RepoError;
use scribe_core::pagination::PageWindow;
use scribe_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostRepository,
    UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_insert_err};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

fn query_err(e: DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

fn txn_err(e: DbErr) -> RepoError {
    RepoError::Connection(e.to_string())
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn count_all(&self) -> Result<u64, RepoError> {
        PostEntity::find().count(&self.db).await.map_err(query_err)
    }

    async fn list_recent(&self, window: PageWindow) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .offset(window.offset)
            .limit(window.limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_by_group(&self, group_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::GroupId.eq(group_id))
            .count(&self.db)
            .await
            .map_err(query_err)
    }

    async fn list_by_group(
        &self,
        group_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(post::Column::GroupId.eq(group_id))
            .order_by_desc(post::Column::CreatedAt)
            .offset(window.offset)
            .limit(window.limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(query_err)
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt)
            .offset(window.offset)
            .limit(window.limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_feed(&self, user_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.in_subquery(followed_authors(user_id)))
            .count(&self.db)
            .await
            .map_err(query_err)
    }

    async fn list_feed(
        &self,
        user_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(post::Column::AuthorId.in_subquery(followed_authors(user_id)))
            .order_by_desc(post::Column::CreatedAt)
            .offset(window.offset)
            .limit(window.limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update_content(
        &self,
        post_id: Uuid,
        text: String,
        group_id: Option<Uuid>,
        image: Option<String>,
    ) -> Result<Post, RepoError> {
        // author_id and created_at stay NotSet and are never written.
        let active = post::ActiveModel {
            id: Unchanged(post_id),
            text: Set(text),
            group_id: Set(group_id),
            image: Set(image),
            ..Default::default()
        };

        match active.update(&self.db).await {
            Ok(model) => Ok(model.into()),
            Err(DbErr::RecordNotUpdated) => Err(RepoError::NotFound),
            Err(e) => Err(query_err(e)),
        }
    }
}

/// Subquery selecting the author ids a user follows.
fn followed_authors(user_id: Uuid) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(follow::Column::AuthorId)
        .from(FollowEntity)
        .and_where(follow::Column::UserId.eq(user_id))
        .to_owned()
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let models = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_by_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .count(&self.db)
            .await
            .map_err(query_err)
    }
}

/// PostgreSQL user repository.
///
/// Not the generic base: user deletion carries the cascade policy.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: User) -> Result<User, RepoError> {
        let active: user::ActiveModel = entity.into();
        let model = active.insert(&self.db).await.map_err(map_insert_err)?;
        Ok(model.into())
    }

    /// Deleting a user takes their posts, the comments under those posts,
    /// the comments they wrote elsewhere, and their follow relations (both
    /// directions) with them.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(txn_err)?;

        let owned_posts = Query::select()
            .column(post::Column::Id)
            .from(PostEntity)
            .and_where(post::Column::AuthorId.eq(id))
            .to_owned();

        CommentEntity::delete_many()
            .filter(comment::Column::PostId.in_subquery(owned_posts))
            .exec(&txn)
            .await
            .map_err(query_err)?;

        CommentEntity::delete_many()
            .filter(comment::Column::AuthorId.eq(id))
            .exec(&txn)
            .await
            .map_err(query_err)?;

        PostEntity::delete_many()
            .filter(post::Column::AuthorId.eq(id))
            .exec(&txn)
            .await
            .map_err(query_err)?;

        FollowEntity::delete_many()
            .filter(
                Condition::any()
                    .add(follow::Column::UserId.eq(id))
                    .add(follow::Column::AuthorId.eq(id)),
            )
            .exec(&txn)
            .await
            .map_err(query_err)?;

        let result = UserEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            // Dropping the transaction rolls the policy back.
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(txn_err)?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

/// PostgreSQL group repository.
///
/// Not the generic base: group deletion clears referencing posts instead of
/// cascading into them.
pub struct PostgresGroupRepository {
    db: DbConn,
}

impl PostgresGroupRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for PostgresGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: Group) -> Result<Group, RepoError> {
        let active: group::ActiveModel = entity.into();
        let model = active.insert(&self.db).await.map_err(map_insert_err)?;
        Ok(model.into())
    }

    /// Posts survive group deletion with their group reference cleared.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(txn_err)?;

        PostEntity::update_many()
            .col_expr(post::Column::GroupId, Expr::value(None::<Uuid>))
            .filter(post::Column::GroupId.eq(id))
            .exec(&txn)
            .await
            .map_err(query_err)?;

        let result = GroupEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(txn_err)?;
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

/// PostgreSQL follow repository.
pub struct PostgresFollowRepository {
    db: DbConn,
}

impl PostgresFollowRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let existing = FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        if existing.is_some() {
            return Ok(false);
        }

        let active: follow::ActiveModel = Follow::new(user_id, author_id).into();

        // A concurrent double-submit lands on the unique index, not on a
        // duplicate row.
        match FollowEntity::insert(active)
            .on_conflict(
                OnConflict::columns([follow::Column::UserId, follow::Column::AuthorId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await
        {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(query_err(e)),
        }
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<(), RepoError> {
        FollowEntity::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let count = FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(query_err)?;

        Ok(count > 0)
    }
}
