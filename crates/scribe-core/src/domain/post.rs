use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Minimum length of a post's text, in characters, after trimming.
pub const MIN_POST_TEXT_CHARS: usize = 15;

pub(crate) const TEXT_TOO_SHORT: &str = "This field must be at least 15 characters long.";

/// Post entity - a short text entry, optionally filed under a group and
/// optionally carrying an image attachment reference.
///
/// `created_at` is set once at creation and never rewritten; edits go
/// through the store's `update_content`, which leaves it untouched.
/// Listings order by `created_at` descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post.
    ///
    /// The length rule is enforced here as well as in the form validator, so
    /// no code path can persist a post shorter than the minimum.
    pub fn new(
        author_id: Uuid,
        text: impl Into<String>,
        group_id: Option<Uuid>,
        image: Option<String>,
    ) -> Result<Self, DomainError> {
        let text = text.into();
        if text.trim().chars().count() < MIN_POST_TEXT_CHARS {
            return Err(DomainError::invalid_field("text", TEXT_TOO_SHORT));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            text,
            group_id,
            image,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_text_shorter_than_minimum() {
        let result = Post::new(Uuid::new_v4(), "too short", None, None);

        let err = result.unwrap_err();
        match err {
            DomainError::Validation(violations) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field, "text");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_padding_does_not_satisfy_the_minimum() {
        let result = Post::new(Uuid::new_v4(), "short          \n\n\n", None, None);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_text_at_the_minimum() {
        let post = Post::new(Uuid::new_v4(), "exactly 15 char", None, None).unwrap();
        assert_eq!(post.text, "exactly 15 char");
        assert!(post.group_id.is_none());
    }
}
