//! Post handlers: listings, detail, create, edit and commenting.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use bytes::BytesMut;
use futures::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;

use scribe_core::domain::{Comment, Post};
use scribe_core::forms::{
    CommentInput, FieldViolation, ImageUpload, PostInput, validate_comment, validate_post,
};
use scribe_core::pagination::Page;
use scribe_shared::dto::{
    CommentFormContext, GroupContext, GroupPostsContext, IndexContext, PostDetailContext,
    PostFormContext,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::context::{self, PageQuery};

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let total = state.posts.count_all().await?;
    let window = state.pagination.window(total, query.page());
    let posts = state.posts.list_recent(window).await?;

    let items = context::post_contexts(&state, posts).await?;
    Ok(HttpResponse::Ok().json(IndexContext {
        page: context::to_page_context(Page::new(items, window)),
    }))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let group = state
        .groups
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group '{slug}' not found")))?;

    let total = state.posts.count_by_group(group.id).await?;
    let window = state.pagination.window(total, query.page());
    let posts = state.posts.list_by_group(group.id, window).await?;

    let items = context::post_contexts(&state, posts).await?;
    Ok(HttpResponse::Ok().json(GroupPostsContext {
        group: GroupContext {
            title: group.title,
            slug: group.slug,
            description: group.description,
        },
        page: context::to_page_context(Page::new(items, window)),
    }))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("post not found".to_string()))?;

    let author_post_count = state.posts.count_by_author(post.author_id).await?;
    let comment_count = state.comments.count_by_post(post_id).await?;
    let comments = state.comments.list_by_post(post_id).await?;

    Ok(HttpResponse::Ok().json(PostDetailContext {
        post: context::post_context(&state, post).await?,
        comments: context::comment_contexts(&state, comments).await?,
        comment_count,
        author_post_count,
        form: CommentFormContext::default(),
    }))
}

/// GET /create/
pub async fn post_create_form(_identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(PostFormContext::default()))
}

/// POST /create/
pub async fn post_create(
    identity: Identity,
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let input = read_post_input(payload).await?;

    let mut violations = validate_post(&input).err().unwrap_or_default();
    let group_id = resolve_group(&state, &input, &mut violations).await?;
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let image = match input.image {
        Some(upload) => Some(state.media.store(upload).await?),
        None => None,
    };

    // The author is always the caller; any client-supplied value was dropped
    // when the body was read.
    let post = Post::new(identity.user_id, input.text, group_id, image)?;
    state.posts.save(post).await?;

    Ok(context::redirect_to(format!(
        "/profile/{}/",
        identity.username
    )))
}

/// GET /posts/{post_id}/edit/
pub async fn post_edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("post not found".to_string()))?;

    if post.author_id != identity.user_id {
        // Non-authors are bounced to the detail view, no error surfaced.
        return Ok(context::redirect_to(format!("/posts/{post_id}/")));
    }

    let group = match post.group_id {
        Some(group_id) => state.groups.find_by_id(group_id).await?.map(|g| g.slug),
        None => None,
    };

    Ok(HttpResponse::Ok().json(PostFormContext {
        text: post.text,
        group,
        is_edit: true,
    }))
}

/// POST /posts/{post_id}/edit/
pub async fn post_edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("post not found".to_string()))?;

    if post.author_id != identity.user_id {
        return Ok(context::redirect_to(format!("/posts/{post_id}/")));
    }

    let input = read_post_input(payload).await?;

    let mut violations = validate_post(&input).err().unwrap_or_default();
    let group_id = resolve_group(&state, &input, &mut violations).await?;
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    // A fresh upload replaces the image; otherwise the existing one stays.
    let image = match input.image {
        Some(upload) => Some(state.media.store(upload).await?),
        None => post.image.clone(),
    };

    state
        .posts
        .update_content(post_id, input.text, group_id, image)
        .await?;

    Ok(context::redirect_to(format!("/posts/{post_id}/")))
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    text: Option<String>,
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("post not found".to_string()))?;

    let input = CommentInput {
        text: form.into_inner().text.unwrap_or_default(),
    };

    match validate_comment(&input) {
        Ok(()) => {
            // post and author are forced server-side.
            let comment = Comment::new(post.id, identity.user_id, input.text);
            state.comments.save(comment).await?;
        }
        Err(violations) => {
            // An invalid comment is dropped; the client is redirected either
            // way.
            tracing::debug!(?violations, "Dropping invalid comment submission");
        }
    }

    Ok(context::redirect_to(format!("/posts/{post_id}/")))
}

/// Resolve the submitted group slug against the store, collecting a
/// violation when it names nothing.
async fn resolve_group(
    state: &AppState,
    input: &PostInput,
    violations: &mut Vec<FieldViolation>,
) -> AppResult<Option<Uuid>> {
    match &input.group {
        Some(slug) => match state.groups.find_by_slug(slug).await? {
            Some(group) => Ok(Some(group.id)),
            None => {
                violations.push(FieldViolation::new(
                    "group",
                    "Select a valid choice. That group does not exist.",
                ));
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Decode a multipart post form into its typed input.
///
/// Unknown fields (including any client-supplied author) are dropped; an
/// empty image part counts as no upload.
async fn read_post_input(mut payload: Multipart) -> AppResult<PostInput> {
    let mut input = PostInput::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or("").to_string();
        let content_type = field.content_type().map(|m| m.essence_str().to_string());
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(str::to_string));

        let mut data = BytesMut::new();
        while let Some(chunk) = field.try_next().await? {
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "text" => input.text = String::from_utf8_lossy(&data).into_owned(),
            "group" => {
                let slug = String::from_utf8_lossy(&data).trim().to_string();
                if !slug.is_empty() {
                    input.group = Some(slug);
                }
            }
            "image" => {
                if data.is_empty() {
                    continue;
                }
                input.image = Some(ImageUpload {
                    filename,
                    content_type: content_type
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    bytes: data.freeze(),
                });
            }
            _ => {}
        }
    }

    Ok(input)
}
