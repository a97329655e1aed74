//! Context objects - what the request handlers hand to the presentation
//! layer for rendering.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A page of items plus its position metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// A post's author as referenced from listings and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

/// A post's group as referenced from listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRef {
    pub slug: String,
    pub title: String,
}

/// A single post as rendered in any listing or detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostContext {
    pub id: Uuid,
    pub text: String,
    pub author: AuthorRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: String,
}

/// Context for the front page listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexContext {
    pub page: PageContext<PostContext>,
}

/// A group's own fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupContext {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Context for a group's post listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPostsContext {
    pub group: GroupContext,
    pub page: PageContext<PostContext>,
}

/// Context for an author's profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileContext {
    pub author: AuthorRef,
    pub post_count: u64,
    /// Whether the caller follows this author; always false for anonymous
    /// callers.
    pub is_following: bool,
    pub page: PageContext<PostContext>,
}

/// A comment as rendered under a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentContext {
    pub id: Uuid,
    pub author: AuthorRef,
    pub text: String,
    pub created_at: String,
}

/// The comment form shown on a post detail page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentFormContext {
    pub text: String,
}

/// Context for a single post's detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailContext {
    pub post: PostContext,
    pub comments: Vec<CommentContext>,
    pub comment_count: u64,
    pub author_post_count: u64,
    pub form: CommentFormContext,
}

/// The post create/edit form: current values plus mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFormContext {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub is_edit: bool,
}

/// Context for the follow feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedContext {
    pub page: PageContext<PostContext>,
}
