//! JSONL file feed.
//!
//! The file is read once at construction. Each non-empty line is one
//! [`Post`]; lines that fail to parse are logged and skipped. Pages are
//! served from the posts matching the active category.

use super::FeedSource;
use crate::model::error::InputError;
use crate::model::{FetchError, Post};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Paged post feed backed by a JSONL file.
///
/// Behaves like a remote pager: the total is not announced, so the
/// timeline pads its scroll height until the feed runs dry.
#[derive(Debug)]
pub struct JsonlFeed {
    path: Option<PathBuf>,
    posts: Vec<Post>,
    // Indices into `posts` matching `category`.
    selected: Vec<usize>,
    category: Option<String>,
    cursor: usize,
    malformed: usize,
}

impl JsonlFeed {
    /// Load posts from `path`.
    ///
    /// # Errors
    ///
    /// Returns `InputError::FileNotFound` if the file does not exist.
    /// Returns `InputError::Io` for other I/O errors.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InputError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let mut feed = Self::from_reader(File::open(path)?)?;
        feed.path = Some(path.to_path_buf());
        info!(path = %path.display(), posts = feed.posts.len(), malformed = feed.malformed, "feed loaded");
        Ok(feed)
    }

    /// Load posts from any reader.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Io` when reading fails.
    pub fn from_reader(reader: impl Read) -> Result<Self, InputError> {
        let mut posts = Vec::new();
        let mut malformed = 0;
        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Post>(trimmed) {
                Ok(post) => posts.push(post),
                Err(e) => {
                    malformed += 1;
                    warn!(line = index + 1, error = %e, "skipping malformed post");
                }
            }
        }

        let selected = (0..posts.len()).collect();
        Ok(Self {
            path: None,
            posts,
            selected,
            category: None,
            cursor: 0,
            malformed,
        })
    }

    /// Switch the category filter and rewind.
    ///
    /// `None` selects every post.
    pub fn set_category(&mut self, category: Option<String>) {
        self.selected = self
            .posts
            .iter()
            .enumerate()
            .filter(|(_, p)| p.in_category(category.as_deref()))
            .map(|(i, _)| i)
            .collect();
        self.category = category;
        self.cursor = 0;
    }

    /// Active category filter.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Distinct categories present in the file, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.posts
            .iter()
            .filter_map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Posts matching the active category.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether no post matches the active category.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Lines that failed to parse.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Source file, when opened from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl FeedSource for JsonlFeed {
    type Item = Post;

    fn fetch_next_page(&mut self, page_size: usize) -> BoxFuture<'static, Result<Vec<Post>, FetchError>> {
        let end = self.cursor.saturating_add(page_size).min(self.selected.len());
        let page: Vec<Post> = self.selected[self.cursor..end]
            .iter()
            .map(|&i| self.posts[i].clone())
            .collect();
        self.cursor = end;
        future::ready(Ok(page)).boxed()
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
    }
}
