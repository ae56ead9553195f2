//! Directory-backed page source.
//!
//! Presents the regular files of a media directory as a cursor-paginated
//! source. The listing is sorted by file name on every fetch, which keeps
//! the ordering stable across a cursor chain as long as the directory is
//! not mutated mid-walk - the same contract the jump algorithm already
//! assumes of the platform media store.

use async_trait::async_trait;
use std::path::PathBuf;

use sift_core::{Cursor, EngineError, ItemId, Page};
use sift_engine::PageSource;

/// Page source over the files of a single directory.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Create a source over `root`. The directory must exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(EngineError::SourceFetch(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    fn list_sorted(&self) -> Result<Vec<String>, EngineError> {
        let entries = std::fs::read_dir(&self.root)
            .map_err(|e| EngineError::SourceFetch(format!("list {}: {e}", self.root.display())))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::SourceFetch(e.to_string()))?;
            let is_file = entry
                .file_type()
                .map_err(|e| EngineError::SourceFetch(e.to_string()))?
                .is_file();
            if !is_file {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                // Non-UTF-8 names cannot round-trip through persistence
                Err(name) => tracing::warn!(?name, "Skipping non-UTF-8 file name"),
            }
        }
        names.sort();
        Ok(names)
    }
}

fn parse_offset(cursor: Option<&Cursor>) -> Result<usize, EngineError> {
    match cursor {
        None => Ok(0),
        Some(c) => c
            .as_ref()
            .parse()
            .map_err(|_| EngineError::SourceFetch(format!("malformed cursor: {}", c.as_ref()))),
    }
}

#[async_trait]
impl PageSource for DirSource {
    async fn fetch_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> Result<Page, EngineError> {
        let offset = parse_offset(cursor)?;
        let names = self.list_sorted()?;

        let start = offset.min(names.len());
        let end = (start + page_size).min(names.len());
        let ids: Vec<ItemId> = names[start..end]
            .iter()
            .map(|n| ItemId::from(n.as_str()))
            .collect();

        if end < names.len() {
            Ok(Page::more(ids, end.to_string()))
        } else {
            Ok(Page::last(ids))
        }
    }
}
