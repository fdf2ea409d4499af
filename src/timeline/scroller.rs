//! Scroll-driven windowing over a [`TimelineManager`].
//!
//! On every scroll the scroller computes which cells intersect the viewport
//! (plus an overscan margin on both sides), detaches the mounted cells that
//! left that window and attaches the ones that entered it. When the window
//! reaches the last loaded cell it starts one page fetch and refuses to
//! start another until [`VirtualScroller::finish_load`] settles it.
//!
//! # Invariants
//! - After `on_scroll` returns, the mounted cells are exactly `mounted_range()`.
//! - Attached nodes are in cell order on the host.
//! - At most one page request is outstanding.

use super::cell::Cell;
use super::manager::{PageOutcome, PageRequest, PageTicket, TimelineManager};
use super::surface::{ListenerId, NodeId, Placement, Renderer, Surface, Viewport};
use crate::model::{FetchError, TimelineError};
use crate::source::FeedSource;
use std::ops::Range;
use tracing::{debug, trace};

/// Default overscan margin, in surface units.
pub const DEFAULT_OVERSCAN: u32 = 600;

/// Cells intersecting the viewport grown by `overscan` on both sides.
///
/// `cells` must be laid out back to back in offset order. Runs two binary
/// searches: the first index whose bottom is below the window top, and the
/// end of the cells whose top is above the window bottom.
pub fn visible_range<T>(cells: &[Cell<T>], viewport: Viewport, overscan: u32) -> Range<usize> {
    let top = viewport.scroll_top.saturating_sub(overscan);
    let bottom = viewport
        .scroll_top
        .saturating_add(viewport.height)
        .saturating_add(overscan);

    let first = cells.partition_point(|c| c.bottom() <= top);
    let end = cells.partition_point(|c| c.offset() < bottom);
    first..end.max(first)
}

/// Result of one scroll recompute.
#[derive(Debug)]
pub struct ScrollOutcome<I> {
    /// The mounted range after the recompute.
    pub range: Range<usize>,
    /// Indices attached by this recompute, ascending.
    pub mounted: Vec<usize>,
    /// Indices detached by this recompute, ascending.
    pub unmounted: Vec<usize>,
    /// Page fetch started because the window reached the tail.
    ///
    /// Drive the future, then hand its result to [`VirtualScroller::finish_load`].
    pub load: Option<PageRequest<I>>,
}

impl<I> ScrollOutcome<I> {
    fn idle(range: Range<usize>) -> Self {
        Self {
            range,
            mounted: Vec::new(),
            unmounted: Vec::new(),
            load: None,
        }
    }

    /// Whether the recompute changed anything.
    pub fn is_idle(&self) -> bool {
        self.mounted.is_empty() && self.unmounted.is_empty() && self.load.is_none()
    }
}

/// Keeps the attached cells of a manager matched to the viewport.
#[derive(Debug)]
pub struct VirtualScroller {
    mounted: Range<usize>,
    overscan: u32,
    loading: bool,
    paused: bool,
    listener: Option<ListenerId>,
}

impl VirtualScroller {
    /// Register a scroll listener on the manager's surface.
    pub fn new<S, R, F>(manager: &mut TimelineManager<S, R, F>, overscan: u32) -> Self
    where
        S: Surface,
        F: FeedSource,
        R: Renderer<F::Item, Content = S::Content>,
    {
        let listener = manager.surface_mut().add_scroll_listener();
        Self {
            mounted: 0..0,
            overscan,
            loading: false,
            paused: false,
            listener: Some(listener),
        }
    }

    /// Recompute the mounted window for the current viewport.
    ///
    /// Cells appended by the manager since the last call count as mounted
    /// going in, so they are detached here if they are out of view.
    /// A no-op while paused or after `dispose`.
    pub fn on_scroll<S, R, F>(
        &mut self,
        manager: &mut TimelineManager<S, R, F>,
    ) -> ScrollOutcome<F::Item>
    where
        S: Surface,
        F: FeedSource,
        R: Renderer<F::Item, Content = S::Content>,
    {
        if self.paused || self.listener.is_none() {
            return ScrollOutcome::idle(self.mounted.clone());
        }

        let current = match manager.take_appended() {
            Some(appended) if self.mounted.is_empty() => appended,
            Some(appended) => {
                self.mounted.start.min(appended.start)..self.mounted.end.max(appended.end)
            }
            None => self.mounted.clone(),
        };

        let viewport = manager.surface().viewport();
        let target = visible_range(manager.cells(), viewport, self.overscan);

        let mut unmounted = Vec::new();
        for index in current.clone() {
            if !target.contains(&index) && manager.unmount_cell(index) {
                unmounted.push(index);
            }
        }

        // Walk backwards so every newcomer can be placed before its already
        // attached successor; nothing past the window stays attached.
        let mut mounted = Vec::new();
        let mut anchor: Option<NodeId> = None;
        for index in target.clone().rev() {
            let cell = &manager.cells()[index];
            if cell.is_mounted() {
                anchor = cell.node();
                continue;
            }
            let placement = anchor.map_or(Placement::Append, Placement::Before);
            anchor = manager.mount_cell(index, placement);
            mounted.push(index);
        }
        mounted.reverse();

        if !mounted.is_empty() || !unmounted.is_empty() {
            trace!(
                target: "vtimeline::scroll",
                scroll_top = viewport.scroll_top,
                from = ?current,
                to = ?target,
                mounted = mounted.len(),
                unmounted = unmounted.len(),
                "window moved"
            );
        }
        self.mounted = target.clone();

        let len = manager.cells().len();
        let load = if len > 0 && target.end == len && !self.loading && !manager.is_exhausted() {
            self.loading = true;
            debug!(target: "vtimeline::scroll", cells = len, "tail reached, loading more");
            Some(manager.request_page())
        } else {
            None
        };

        ScrollOutcome {
            range: target,
            mounted,
            unmounted,
            load,
        }
    }

    /// Settle the outstanding page request.
    ///
    /// The single-flight guard is released whether the page applies, fails,
    /// or is stale.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::Fetch`] when the fetch failed.
    pub async fn finish_load<S, R, F>(
        &mut self,
        manager: &mut TimelineManager<S, R, F>,
        ticket: PageTicket,
        result: Result<Vec<F::Item>, FetchError>,
    ) -> Result<PageOutcome, TimelineError>
    where
        S: Surface,
        F: FeedSource,
        R: Renderer<F::Item, Content = S::Content>,
    {
        self.loading = false;
        manager.complete_page(ticket, result).await
    }

    /// Remove the scroll listener. Calling it again is a no-op.
    pub fn dispose<S, R, F>(&mut self, manager: &mut TimelineManager<S, R, F>)
    where
        S: Surface,
        F: FeedSource,
        R: Renderer<F::Item, Content = S::Content>,
    {
        if let Some(listener) = self.listener.take() {
            manager.surface_mut().remove_scroll_listener(listener);
            debug!(target: "vtimeline::scroll", "scroller disposed");
        }
        self.mounted = 0..0;
        self.loading = false;
    }

    /// Forget the mounted window after the manager was re-initialised.
    pub fn reset(&mut self) {
        self.mounted = 0..0;
        self.loading = false;
    }

    /// Stop reacting to scrolls.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// React to scrolls again. The next `on_scroll` catches up.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Currently mounted cells.
    pub fn mounted_range(&self) -> Range<usize> {
        self.mounted.clone()
    }

    /// Overscan margin.
    pub fn overscan(&self) -> u32 {
        self.overscan
    }

    /// Whether a page request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether scrolls are ignored.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether `dispose` ran.
    pub fn is_disposed(&self) -> bool {
        self.listener.is_none()
    }
}

#[cfg(test)]
#[path = "scroller_tests.rs"]
mod tests;
