//! Feed post - the renderable item of the terminal timeline.

use super::identifiers::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single post read from a feed.
///
/// Deserialized from one JSONL line:
///
/// ```json
/// {"id":"42","author":"ferris","text":"hello","created_at":"2025-03-01T10:00:00Z","category":"rust"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stable post id.
    pub id: PostId,
    /// Display name of the author.
    pub author: String,
    /// Body text. May contain newlines.
    pub text: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Category the post was filed under, if any.
    #[serde(default)]
    pub category: Option<String>,
    /// Like counter.
    #[serde(default)]
    pub likes: u32,
}

impl Post {
    /// Whether this post belongs to `category`.
    ///
    /// `None` matches every post.
    pub fn in_category(&self, category: Option<&str>) -> bool {
        match category {
            None => true,
            Some(wanted) => self.category.as_deref() == Some(wanted),
        }
    }
}
