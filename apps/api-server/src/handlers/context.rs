//! Shared helpers for building render contexts out of domain entities.

use std::collections::HashMap;

use actix_web::{HttpResponse, http::header};
use serde::Deserialize;
use uuid::Uuid;

use scribe_core::domain::{Comment, Post, User};
use scribe_core::pagination::Page;
use scribe_shared::dto::{AuthorRef, CommentContext, GroupRef, PageContext, PostContext};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// The `page` query parameter of listing endpoints. Anything that does not
/// parse as an integer falls back to the first page.
#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub(crate) fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1)
    }
}

/// 302 to the given location, the way every successful mutation answers.
pub(crate) fn redirect_to(location: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn author_ref(user: &User) -> AuthorRef {
    AuthorRef {
        id: user.id,
        username: user.username.clone(),
    }
}

pub(crate) fn to_page_context<T>(page: Page<T>) -> PageContext<T> {
    PageContext {
        items: page.items,
        number: page.number,
        total_pages: page.total_pages,
        total_items: page.total_items,
        has_next: page.has_next,
        has_previous: page.has_previous,
    }
}

async fn resolve_author(
    state: &AppState,
    cache: &mut HashMap<Uuid, AuthorRef>,
    author_id: Uuid,
) -> AppResult<AuthorRef> {
    if let Some(author) = cache.get(&author_id) {
        return Ok(author.clone());
    }
    let user = state
        .users
        .find_by_id(author_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("author {author_id} missing")))?;
    let author = author_ref(&user);
    cache.insert(author_id, author.clone());
    Ok(author)
}

/// Build the listing context for a batch of posts, resolving authors and
/// groups once per distinct id.
pub(crate) async fn post_contexts(
    state: &AppState,
    posts: Vec<Post>,
) -> AppResult<Vec<PostContext>> {
    let mut authors: HashMap<Uuid, AuthorRef> = HashMap::new();
    let mut groups: HashMap<Uuid, GroupRef> = HashMap::new();
    let mut contexts = Vec::with_capacity(posts.len());

    for post in posts {
        let author = resolve_author(state, &mut authors, post.author_id).await?;

        let group = match post.group_id {
            Some(group_id) => match groups.get(&group_id) {
                Some(group) => Some(group.clone()),
                None => {
                    let group = state
                        .groups
                        .find_by_id(group_id)
                        .await?
                        .ok_or_else(|| AppError::Internal(format!("group {group_id} missing")))?;
                    let group = GroupRef {
                        slug: group.slug,
                        title: group.title,
                    };
                    groups.insert(group_id, group.clone());
                    Some(group)
                }
            },
            None => None,
        };

        contexts.push(PostContext {
            id: post.id,
            text: post.text,
            author,
            group,
            image: post.image,
            created_at: post.created_at.to_rfc3339(),
        });
    }

    Ok(contexts)
}

pub(crate) async fn post_context(state: &AppState, post: Post) -> AppResult<PostContext> {
    let mut contexts = post_contexts(state, vec![post]).await?;
    Ok(contexts.remove(0))
}

pub(crate) async fn comment_contexts(
    state: &AppState,
    comments: Vec<Comment>,
) -> AppResult<Vec<CommentContext>> {
    let mut authors: HashMap<Uuid, AuthorRef> = HashMap::new();
    let mut contexts = Vec::with_capacity(comments.len());

    for comment in comments {
        let author = resolve_author(state, &mut authors, comment.author_id).await?;
        contexts.push(CommentContext {
            id: comment.id,
            author,
            text: comment.text,
            created_at: comment.created_at.to_rfc3339(),
        });
    }

    Ok(contexts)
}
