//! In-memory feed with call counting and failure injection.

use super::FeedSource;
use crate::model::FetchError;
use futures::future::{self, BoxFuture, FutureExt};

/// Feed over a fixed list of items.
#[derive(Debug, Clone)]
pub struct MemoryFeed<T> {
    items: Vec<T>,
    cursor: usize,
    fetch_calls: usize,
    fail_next: Option<FetchError>,
    announce_total: bool,
}

impl<T> MemoryFeed<T> {
    /// Feed that does not reveal its length.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: 0,
            fetch_calls: 0,
            fail_next: None,
            announce_total: false,
        }
    }

    /// Feed that reports its length through [`FeedSource::total_hint`].
    pub fn with_known_total(items: Vec<T>) -> Self {
        Self {
            announce_total: true,
            ..Self::new(items)
        }
    }

    /// Make the next fetch fail with `error`.
    pub fn fail_next(&mut self, error: FetchError) {
        self.fail_next = Some(error);
    }

    /// Append items behind the current end, as a live feed would.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
    }

    /// Number of `fetch_next_page` calls so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls
    }

    /// Index of the next item to serve.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<T: Clone + Send + 'static> FeedSource for MemoryFeed<T> {
    type Item = T;

    fn fetch_next_page(&mut self, page_size: usize) -> BoxFuture<'static, Result<Vec<T>, FetchError>> {
        self.fetch_calls += 1;
        if let Some(error) = self.fail_next.take() {
            return future::ready(Err(error)).boxed();
        }
        let end = self.cursor.saturating_add(page_size).min(self.items.len());
        let page = self.items[self.cursor..end].to_vec();
        self.cursor = end;
        future::ready(Ok(page)).boxed()
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    fn total_hint(&self) -> Option<usize> {
        self.announce_total.then_some(self.items.len())
    }
}
