//! Ordered cell collection, layout bookkeeping, and page fetching.
//!
//! The manager is the only writer of cell offsets. Cells are laid out
//! back to back from offset 0:
//!
//! ```text
//! cells[i].offset + cells[i].height == cells[i + 1].offset
//! list_height == last.offset + last.height   (0 when empty)
//! ```
//!
//! Every append and every height change restores this before returning.
//!
//! Fetching is split in two halves so the scroller can keep a request in
//! flight while the host keeps handling events: [`TimelineManager::request_page`]
//! starts a fetch and hands back a [`PageTicket`], and
//! [`TimelineManager::complete_page`] applies the result. Tickets carry the
//! manager's generation; `dispose` and `init_first_page` bump it, so pages
//! that land after a reset are dropped instead of appended to the new state.

use super::cell::{Cell, MountContext, SettlePolicy};
use super::resize::{ResizeAggregator, ResizeOptions};
use super::surface::{NodeId, Placement, Renderer, Surface};
use crate::model::{CellId, ConfigurationError, FetchError, TimelineError};
use crate::source::FeedSource;
use futures::future::BoxFuture;
use std::fmt;
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Default assumed feed length for scroll-height padding.
pub const DEFAULT_ASSUMED_TOTAL: usize = 100;

/// Tuning for [`TimelineManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineOptions {
    /// Items requested by `load_more_data` and scroll-driven pagination.
    pub page_size: usize,
    /// Items requested by `init_first_page`.
    pub first_page_size: usize,
    /// Feed length assumed while the real one is unknown.
    ///
    /// Only affects the padded content height, never layout.
    pub assumed_total_count: usize,
    /// Height stabilization for freshly rendered cells.
    pub settle: SettlePolicy,
    /// Size-change debouncing.
    pub resize: ResizeOptions,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            first_page_size: DEFAULT_PAGE_SIZE,
            assumed_total_count: DEFAULT_ASSUMED_TOTAL,
            settle: SettlePolicy::default(),
            resize: ResizeOptions::default(),
        }
    }
}

impl TimelineOptions {
    /// Reject page sizes of zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NonPositivePageSize`] for the first
    /// page size that is 0.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for page_size in [self.first_page_size, self.page_size] {
            if page_size == 0 {
                return Err(ConfigurationError::NonPositivePageSize { page_size });
            }
        }
        Ok(())
    }
}

/// Identifies one outstanding page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
    page_size: usize,
}

impl PageTicket {
    /// Manager generation the request was made in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Requested page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// A started fetch: its ticket and the future yielding the page.
pub struct PageRequest<I> {
    /// Pass back to [`TimelineManager::complete_page`].
    pub ticket: PageTicket,
    /// Resolves to the page.
    pub future: BoxFuture<'static, Result<Vec<I>, FetchError>>,
}

impl<I> fmt::Debug for PageRequest<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRequest")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// What applying a page did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// This many cells were appended.
    Appended(usize),
    /// The page was empty; the feed has no more items.
    Exhausted,
    /// The page belonged to an earlier generation and was dropped.
    Discarded,
}

/// Owns the cells of one timeline and lays them out on a [`Surface`].
pub struct TimelineManager<S, R, F>
where
    F: FeedSource,
{
    surface: S,
    renderer: R,
    source: F,
    options: TimelineOptions,
    cells: Vec<Cell<F::Item>>,
    list_height: u32,
    resize: ResizeAggregator,
    generation: u64,
    next_cell_id: u64,
    exhausted: bool,
    disposed: bool,
    // Cells mounted by appends since the scroller last looked.
    appended: Option<Range<usize>>,
}

impl<S, R, F> TimelineManager<S, R, F>
where
    S: Surface,
    F: FeedSource,
    R: Renderer<F::Item, Content = S::Content>,
{
    /// Create an empty manager.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when `options` fail validation.
    pub fn new(
        surface: S,
        renderer: R,
        source: F,
        options: TimelineOptions,
    ) -> Result<Self, ConfigurationError> {
        options.validate()?;
        Ok(Self {
            surface,
            renderer,
            source,
            resize: ResizeAggregator::new(options.resize),
            options,
            cells: Vec::new(),
            list_height: 0,
            generation: 0,
            next_cell_id: 0,
            exhausted: false,
            disposed: false,
            appended: None,
        })
    }

    // ===== Pagination =====

    /// Reset everything and load the first page at offset 0.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::Fetch`] when the source rejects the request.
    pub async fn init_first_page(&mut self) -> Result<PageOutcome, TimelineError> {
        self.reset_state();
        self.disposed = false;
        let request = self.request_sized(self.options.first_page_size);
        let result = request.future.await;
        let outcome = self.complete_page(request.ticket, result).await?;
        info!(target: "vtimeline::pager", cells = self.cells.len(), list_height = self.list_height, "first page loaded");
        Ok(outcome)
    }

    /// Fetch and append the next page.
    ///
    /// An empty page marks the feed exhausted and changes nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::Fetch`] when the source rejects the request.
    pub async fn load_more_data(&mut self) -> Result<PageOutcome, TimelineError> {
        let request = self.request_page();
        let result = request.future.await;
        self.complete_page(request.ticket, result).await
    }

    /// Start fetching the next page without waiting for it.
    pub fn request_page(&mut self) -> PageRequest<F::Item> {
        self.request_sized(self.options.page_size)
    }

    /// Apply a page fetched through [`Self::request_page`].
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::Fetch`] when `result` is a failure of the
    /// current generation. Failures of stale tickets are discarded.
    pub async fn complete_page(
        &mut self,
        ticket: PageTicket,
        result: Result<Vec<F::Item>, FetchError>,
    ) -> Result<PageOutcome, TimelineError> {
        if ticket.generation != self.generation {
            debug!(
                target: "vtimeline::pager",
                ticket = ticket.generation,
                current = self.generation,
                "dropping page from a previous generation"
            );
            return Ok(PageOutcome::Discarded);
        }

        let items = result.inspect_err(|e| {
            warn!(target: "vtimeline::pager", error = %e, "page fetch failed");
        })?;

        if items.is_empty() {
            debug!(target: "vtimeline::pager", cells = self.cells.len(), "feed exhausted");
            self.exhausted = true;
            return Ok(PageOutcome::Exhausted);
        }

        let count = items.len();
        self.append_items(items).await;
        Ok(PageOutcome::Appended(count))
    }

    fn request_sized(&mut self, page_size: usize) -> PageRequest<F::Item> {
        debug!(target: "vtimeline::pager", page_size, generation = self.generation, "requesting page");
        PageRequest {
            ticket: PageTicket {
                generation: self.generation,
                page_size,
            },
            future: self.source.fetch_next_page(page_size),
        }
    }

    // ===== Layout =====

    /// Mount each item as a new cell at the running end of the list.
    ///
    /// Each cell settles its height before the next one is placed. Appending
    /// nothing is a no-op.
    pub async fn append_items(&mut self, items: Vec<F::Item>) {
        if items.is_empty() {
            return;
        }
        let start = self.cells.len();

        for item in items {
            let index = self.cells.len();
            let mut cell = Cell::new(CellId::new(self.next_cell_id), item);
            self.next_cell_id += 1;

            let mut ctx = MountContext {
                surface: &mut self.surface,
                renderer: &mut self.renderer,
                resize: &mut self.resize,
                settle: self.options.settle,
            };
            cell.mount(&mut ctx, index, self.list_height, Placement::Append)
                .await;

            self.list_height = cell.bottom();
            self.cells.push(cell);
        }

        let end = self.cells.len();
        self.appended = Some(match self.appended.take() {
            Some(pending) => pending.start.min(start)..end,
            None => start..end,
        });
        self.refresh_content_height();
        debug!(
            target: "vtimeline::pager",
            appended = end - start,
            cells = end,
            list_height = self.list_height,
            "items appended"
        );
    }

    /// Shift every cell after `id` by `delta`.
    ///
    /// `delta` is the change the cell already applied to its own height
    /// (see [`Cell::report_height`]). Mounted cells are repositioned
    /// immediately. Unknown ids, e.g. from reports that raced a dispose,
    /// are ignored.
    pub fn on_cell_height_change(&mut self, id: CellId, delta: i64) {
        let Ok(index) = self.cells.binary_search_by_key(&id, |c| c.id()) else {
            debug!(target: "vtimeline::resize", cell = %id, "height change for unknown cell ignored");
            return;
        };
        if delta == 0 {
            return;
        }

        for cell in &mut self.cells[index + 1..] {
            let offset = shift(cell.offset(), delta);
            cell.set_offset(offset, &mut self.surface);
        }
        self.list_height = shift(self.list_height, delta);
        self.refresh_content_height();
        debug!(target: "vtimeline::resize", cell = %id, index, delta, list_height = self.list_height, "offsets shifted");
    }

    /// Give cell `id` a new height and propagate the change.
    ///
    /// The resize baseline of the cell's node moves to `height`, so later
    /// samples are compared against what the layout now assumes.
    /// Returns the applied delta, or `None` when the id is unknown or the
    /// height did not change.
    pub fn resize_cell(&mut self, id: CellId, height: u32) -> Option<i64> {
        let index = self.cells.binary_search_by_key(&id, |c| c.id()).ok()?;
        let cell = &mut self.cells[index];
        let delta = cell.report_height(height)?;
        if let Some(node) = cell.node() {
            self.resize.rebase(node, height);
        }
        self.on_cell_height_change(id, delta);
        Some(delta)
    }

    /// Scrollable height to give the host.
    ///
    /// The real list height once the feed length is known (announced by the
    /// source or reached by exhaustion). Until then, the average height so
    /// far extrapolated to `assumed_total_count` items, but never less than
    /// the real height.
    pub fn content_height(&self) -> u32 {
        let loaded = self.cells.len();
        if loaded == 0 || self.exhausted || self.source.total_hint().is_some() {
            return self.list_height;
        }
        let estimate = u64::from(self.list_height)
            .saturating_mul(self.options.assumed_total_count as u64)
            / loaded as u64;
        self.list_height
            .max(u32::try_from(estimate).unwrap_or(u32::MAX))
    }

    fn refresh_content_height(&mut self) {
        let height = self.content_height();
        self.surface.set_content_height(Some(height));
    }

    // ===== Mounting (driven by the scroller) =====

    /// Attach cell `index` with its cached node and height.
    ///
    /// Returns the cell's node, or `None` for an out-of-range index.
    /// Already mounted cells are left where they are.
    pub fn mount_cell(&mut self, index: usize, placement: Placement) -> Option<NodeId> {
        let cell = self.cells.get_mut(index)?;
        if !cell.is_mounted() {
            let offset = cell.offset();
            let mut ctx = MountContext {
                surface: &mut self.surface,
                renderer: &mut self.renderer,
                resize: &mut self.resize,
                settle: self.options.settle,
            };
            cell.remount(&mut ctx, index, offset, placement);
        }
        cell.node()
    }

    /// Detach cell `index`. Returns whether anything was detached.
    pub fn unmount_cell(&mut self, index: usize) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) => cell.unmount(&mut self.surface),
            None => false,
        }
    }

    /// Range of cells appended (and mounted) since the last call.
    pub fn take_appended(&mut self) -> Option<Range<usize>> {
        self.appended.take()
    }

    // ===== Resize path =====

    /// Move the host's pending size changes into the resize aggregator.
    pub fn poll_size_changes(&mut self, now: Instant) {
        for (node, height) in self.surface.take_size_changes() {
            self.resize.record(node, height, now);
        }
    }

    /// Apply the debounced size changes that are due at `now`.
    ///
    /// Returns how many cells changed height.
    pub fn flush_resizes(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        for report in self.resize.flush_due(now) {
            let Some(cell) = self.cells.get_mut(report.index) else {
                debug!(target: "vtimeline::resize", index = report.index, "report for missing cell ignored");
                continue;
            };
            if cell.node() != Some(report.node) {
                debug!(target: "vtimeline::resize", index = report.index, "stale report ignored");
                continue;
            }
            if let Some(delta) = cell.report_height(report.height) {
                let id = cell.id();
                self.on_cell_height_change(id, delta);
                applied += 1;
            }
        }
        applied
    }

    /// When the next resize flush is due.
    pub fn next_resize_deadline(&self) -> Option<Instant> {
        self.resize.next_deadline()
    }

    // ===== Lifecycle =====

    /// Unmount and drop every cell, clear the host, and rewind the source.
    ///
    /// Invalidates outstanding page tickets. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.reset_state();
        self.disposed = true;
        info!(target: "vtimeline::pager", "timeline disposed");
    }

    fn reset_state(&mut self) {
        for cell in &mut self.cells {
            cell.unmount(&mut self.surface);
        }
        self.cells.clear();
        self.resize.disconnect();
        self.source.reset_cursor();
        self.surface.clear();
        self.surface.set_content_height(None);
        self.list_height = 0;
        self.exhausted = false;
        self.appended = None;
        self.generation = self.generation.wrapping_add(1);
    }

    // ===== Accessors =====

    /// Cells in offset order.
    pub fn cells(&self) -> &[Cell<F::Item>] {
        &self.cells
    }

    /// Index of the cell covering `offset`.
    pub fn cell_at(&self, offset: u32) -> Option<usize> {
        let index = self.cells.partition_point(|c| c.bottom() <= offset);
        self.cells
            .get(index)
            .filter(|c| c.offset() <= offset)
            .map(|_| index)
    }

    /// Bottom edge of the last cell.
    pub fn list_height(&self) -> u32 {
        self.list_height
    }

    /// Whether the source returned an empty page.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether `dispose` ran since the last `init_first_page`.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Active options.
    pub fn options(&self) -> &TimelineOptions {
        &self.options
    }

    /// The host surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The host surface, mutably (scrolling, resizing the viewport).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The feed source.
    pub fn source(&self) -> &F {
        &self.source
    }

    /// The feed source, mutably (switching filters before a re-init).
    pub fn source_mut(&mut self) -> &mut F {
        &mut self.source
    }
}

fn shift(value: u32, delta: i64) -> u32 {
    (i64::from(value) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
