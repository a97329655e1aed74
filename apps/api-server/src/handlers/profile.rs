//! Profile and follow handlers.

use actix_web::{HttpResponse, web};

use scribe_core::pagination::Page;
use scribe_shared::dto::{FeedContext, ProfileContext};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::context::{self, PageQuery};

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{username}' not found")))?;

    let post_count = state.posts.count_by_author(author.id).await?;
    let window = state.pagination.window(post_count, query.page());
    let posts = state.posts.list_by_author(author.id, window).await?;
    let items = context::post_contexts(&state, posts).await?;

    // Anonymous callers never count as following.
    let is_following = match identity.0 {
        Some(caller) => {
            state
                .follows
                .is_following(caller.user_id, author.id)
                .await?
        }
        None => false,
    };

    Ok(HttpResponse::Ok().json(ProfileContext {
        author: context::author_ref(&author),
        post_count,
        is_following,
        page: context::to_page_context(Page::new(items, window)),
    }))
}

/// GET /follow/
pub async fn follow_index(
    identity: Identity,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let total = state.posts.count_feed(identity.user_id).await?;
    let window = state.pagination.window(total, query.page());
    let posts = state.posts.list_feed(identity.user_id, window).await?;

    let items = context::post_contexts(&state, posts).await?;
    Ok(HttpResponse::Ok().json(FeedContext {
        page: context::to_page_context(Page::new(items, window)),
    }))
}

/// POST /profile/{username}/follow/
pub async fn profile_follow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{username}' not found")))?;

    // Following yourself is silently refused; re-following is get-or-create.
    if identity.user_id != author.id {
        state.follows.follow(identity.user_id, author.id).await?;
    }

    Ok(context::redirect_to(format!("/profile/{username}/")))
}

/// POST /profile/{username}/unfollow/
pub async fn profile_unfollow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{username}' not found")))?;

    state.follows.unfollow(identity.user_id, author.id).await?;

    Ok(context::redirect_to(format!("/profile/{username}/")))
}
