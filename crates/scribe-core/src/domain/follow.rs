use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Follow entity - a directed relation meaning `user_id` receives
/// `author_id`'s posts in their feed.
///
/// The `(user_id, author_id)` pair is unique; creating it is get-or-create,
/// so re-following is a no-op rather than a duplicate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: Uuid,
}

impl Follow {
    pub fn new(user_id: Uuid, author_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            author_id,
        }
    }
}
