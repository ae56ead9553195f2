//! Item identifier and page types for the paginated media source.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Opaque media item identifier.
///
/// Unique within the source's ordering. Not guaranteed stable across
/// OS upgrades or reinstalls; equality is value equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque continuation token returned by a paginated source.
///
/// Only the source that minted a cursor can interpret it; the engine
/// treats it as a resume point and nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(pub String);

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Cursor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One page of results from the media source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Item identifiers in source order.
    pub ids: Vec<ItemId>,

    /// Continuation token for the next page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,

    /// Whether the source reports further pages beyond this one.
    pub has_more: bool,
}

impl Page {
    /// Create a terminal page with no continuation.
    pub fn last(ids: Vec<ItemId>) -> Self {
        Self {
            ids,
            next_cursor: None,
            has_more: false,
        }
    }

    /// Create a page that continues at `cursor`.
    pub fn more(ids: Vec<ItemId>, cursor: impl Into<Cursor>) -> Self {
        Self {
            ids,
            next_cursor: Some(cursor.into()),
            has_more: true,
        }
    }

    /// Number of raw identifiers in this page.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the page carries no identifiers.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
