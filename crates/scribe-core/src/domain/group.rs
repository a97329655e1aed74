use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group entity - a category posts can be filed under.
///
/// The slug is the external identifier used in URLs and must be unique.
/// Deleting a group never deletes its posts; their group reference is
/// cleared by the store's delete policy instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            slug: slug.into(),
            description: description.into(),
        }
    }
}
