//! One timeline row: its node, position, and measured height.
//!
//! A cell renders its node at most once and reuses it across every
//! mount/unmount cycle. Its offset is owned by the manager; the cell only
//! stores it and applies it to the node.

use super::resize::ResizeAggregator;
use super::surface::{NodeId, Placement, Renderer, Surface};
use crate::model::CellId;
use std::time::Duration;
use tracing::{debug, trace};

/// How long a freshly attached node may take to settle.
///
/// The first sample is taken right after attaching; each retry waits
/// `interval` and samples again. Measurement stops as soon as two consecutive
/// samples differ by at most `epsilon`. When retries run out the last sample
/// is used as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    /// Number of wait-and-resample rounds.
    pub retries: u32,
    /// Wait between samples.
    pub interval: Duration,
    /// Largest difference between consecutive samples that counts as stable.
    pub epsilon: u32,
}

impl SettlePolicy {
    /// Trust the first sample.
    pub fn immediate() -> Self {
        Self {
            retries: 0,
            interval: Duration::ZERO,
            epsilon: 0,
        }
    }
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            interval: Duration::from_millis(20),
            epsilon: 0,
        }
    }
}

/// Everything a cell needs to mount: the host, the renderer, and the resize feed.
pub(crate) struct MountContext<'a, S, R> {
    pub surface: &'a mut S,
    pub renderer: &'a mut R,
    pub resize: &'a mut ResizeAggregator,
    pub settle: SettlePolicy,
}

/// A single row of the timeline.
#[derive(Debug)]
pub struct Cell<T> {
    id: CellId,
    data: T,
    node: Option<NodeId>,
    offset: u32,
    height: u32,
    measured: bool,
    attached: bool,
}

impl<T> Cell<T> {
    pub(crate) fn new(id: CellId, data: T) -> Self {
        Self {
            id,
            data,
            node: None,
            offset: 0,
            height: 0,
            measured: false,
            attached: false,
        }
    }

    /// Stable identity within one manager lifetime.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// The item this row shows.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Node handle, once the first mount rendered it.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Distance from the top of the content.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Last known height, 0 before the first measurement.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `offset + height`.
    pub fn bottom(&self) -> u32 {
        self.offset.saturating_add(self.height)
    }

    /// Whether the height came from a measurement.
    pub fn is_measured(&self) -> bool {
        self.measured
    }

    /// Whether the node is attached to the host.
    pub fn is_mounted(&self) -> bool {
        self.attached
    }

    /// Attach at `offset`, rendering the node on first use and waiting for
    /// its height to settle when it was never measured.
    ///
    /// The first mount also registers the node with the resize aggregator
    /// under `index`, using the settled height as baseline.
    pub(crate) async fn mount<S, R>(
        &mut self,
        ctx: &mut MountContext<'_, S, R>,
        index: usize,
        offset: u32,
        placement: Placement,
    ) where
        S: Surface,
        R: Renderer<T, Content = S::Content>,
    {
        let (node, first) = self.attach(ctx, offset, placement);
        if !self.measured {
            self.height = settle(&mut *ctx.surface, node, ctx.settle).await;
            self.measured = true;
        }
        if first {
            ctx.resize.observe(node, index, self.height);
        }
        trace!(target: "vtimeline::mount", cell = %self.id, index, offset, height = self.height, "mounted");
    }

    /// Synchronous mount for cells coming back into view.
    ///
    /// Reuses the cached node and height. A cell that was never measured
    /// gets a single best-effort sample.
    pub(crate) fn remount<S, R>(
        &mut self,
        ctx: &mut MountContext<'_, S, R>,
        index: usize,
        offset: u32,
        placement: Placement,
    ) where
        S: Surface,
        R: Renderer<T, Content = S::Content>,
    {
        let (node, first) = self.attach(ctx, offset, placement);
        if !self.measured {
            self.height = ctx.surface.measure(node);
            self.measured = true;
        }
        if first {
            ctx.resize.observe(node, index, self.height);
        }
        trace!(target: "vtimeline::mount", cell = %self.id, index, offset, "remounted");
    }

    /// Detach the node, keeping it and its resize tracking for reuse.
    ///
    /// Returns whether anything was detached.
    pub(crate) fn unmount<S: Surface>(&mut self, surface: &mut S) -> bool {
        match self.node {
            Some(node) if self.attached => {
                surface.detach(node);
                self.attached = false;
                trace!(target: "vtimeline::mount", cell = %self.id, "unmounted");
                true
            }
            _ => false,
        }
    }

    /// Take a new height from the resize path.
    ///
    /// Returns the signed change, or `None` when the height is unchanged.
    pub fn report_height(&mut self, height: u32) -> Option<i64> {
        let delta = i64::from(height) - i64::from(self.height);
        if delta == 0 {
            return None;
        }
        self.height = height;
        self.measured = true;
        Some(delta)
    }

    /// Move the cell, repositioning the node when attached.
    pub(crate) fn set_offset<S: Surface>(&mut self, offset: u32, surface: &mut S) {
        self.offset = offset;
        if let (Some(node), true) = (self.node, self.attached) {
            surface.set_offset(node, offset);
        }
    }

    fn attach<S, R>(
        &mut self,
        ctx: &mut MountContext<'_, S, R>,
        offset: u32,
        placement: Placement,
    ) -> (NodeId, bool)
    where
        S: Surface,
        R: Renderer<T, Content = S::Content>,
    {
        self.offset = offset;
        let (node, first) = match self.node {
            Some(node) => (node, false),
            None => {
                let node = ctx.surface.create_node(ctx.renderer.render(&self.data));
                self.node = Some(node);
                (node, true)
            }
        };
        ctx.surface.attach(node, offset, placement);
        self.attached = true;
        (node, first)
    }
}

/// Sample `node` until two consecutive samples agree within `policy.epsilon`.
async fn settle<S: Surface>(surface: &mut S, node: NodeId, policy: SettlePolicy) -> u32 {
    let mut last = surface.measure(node);
    for _ in 0..policy.retries {
        tokio::time::sleep(policy.interval).await;
        let sample = surface.measure(node);
        let stable = sample.abs_diff(last) <= policy.epsilon;
        last = sample;
        if stable {
            return last;
        }
    }
    if policy.retries > 0 {
        debug!(target: "vtimeline::mount", %node, height = last, "height did not settle, using last sample");
    }
    last
}
