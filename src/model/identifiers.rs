//! Identifier newtypes.
//!
//! String identifiers validate non-empty input at construction time.
//! Numeric identifiers are allocated by their owners and never constructed
//! from outside the crate.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable identifier of a feed post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

/// Error returned when a post identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("post id must not be empty")]
pub struct InvalidPostId;

impl PostId {
    /// Smart constructor: validates non-empty (after trimming) id.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidPostId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            Err(InvalidPostId)
        } else {
            Ok(Self(raw))
        }
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        PostId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a timeline cell.
///
/// Allocated monotonically by the timeline manager, so ids are sorted in
/// cell order and never reused across `dispose` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_id_rejects_empty() {
        assert_eq!(PostId::new(""), Err(InvalidPostId));
        assert_eq!(PostId::new("   "), Err(InvalidPostId));
    }

    #[test]
    fn post_id_accepts_non_empty() {
        let id = PostId::new("1790").unwrap();
        assert_eq!(id.as_str(), "1790");
        assert_eq!(id.to_string(), "1790");
    }

    #[test]
    fn post_id_deserialize_validates() {
        let ok: Result<PostId, _> = serde_json::from_str(r#""abc""#);
        assert_eq!(ok.unwrap().as_str(), "abc");

        let err: Result<PostId, _> = serde_json::from_str(r#""""#);
        assert!(err.is_err());
    }

    #[test]
    fn cell_ids_order_by_allocation() {
        assert!(CellId::new(1) < CellId::new(2));
        assert_eq!(CellId::new(7).to_string(), "cell#7");
    }
}
