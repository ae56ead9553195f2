//! Seam to the paginated media source.

use async_trait::async_trait;

use sift_core::{Cursor, EngineError, Page};

/// A cursor-paginated source of media item identifiers.
///
/// Implementations must be stable-ordered across calls with the same
/// cursor chain: re-walking from the start yields items in the same
/// order, which the jump algorithm depends on.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page of at most `page_size` identifiers.
    ///
    /// `None` for the cursor requests the first page. The returned page
    /// carries the continuation token for the next call, or none if the
    /// source is exhausted.
    async fn fetch_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> Result<Page, EngineError>;
}
