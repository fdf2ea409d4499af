//! Feed sources.
//!
//! The timeline pulls pages through the [`FeedSource`] trait:
//! - [`MemoryFeed`] serves a fixed in-memory list (tests, benches, demos)
//! - [`JsonlFeed`] serves posts read once from a JSONL file, filtered by category

use crate::model::FetchError;
use futures::future::BoxFuture;

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlFeed;
pub use memory::MemoryFeed;

/// Paged, forward-only item source with its own cursor.
pub trait FeedSource {
    /// The items a page carries.
    type Item: Send + 'static;

    /// Request the next page of at most `page_size` items.
    ///
    /// The cursor advances when the request is made, not when the future
    /// resolves. An empty page means the feed is exhausted.
    ///
    /// # Errors
    ///
    /// The returned future yields [`FetchError`] when the page cannot be
    /// produced; the cursor is left where the request found it.
    fn fetch_next_page(
        &mut self,
        page_size: usize,
    ) -> BoxFuture<'static, Result<Vec<Self::Item>, FetchError>>;

    /// Rewind to the first page.
    fn reset_cursor(&mut self);

    /// Total number of items, when the source knows it.
    fn total_hint(&self) -> Option<usize> {
        None
    }
}
