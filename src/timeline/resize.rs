//! Debounced, coalescing size-change aggregation.
//!
//! Size samples for observed nodes are collected into a pending batch and
//! released together once the debounce window since the first sample of the
//! batch has elapsed. Within one batch only the latest height per node survives,
//! and samples within the noise threshold of the node's last reported height
//! are dropped.
//!
//! Time is passed in explicitly, so the aggregator is driven by whatever
//! timer the host has (the TUI loop sleeps until [`ResizeAggregator::next_deadline`]).

use super::surface::NodeId;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(20);

/// Default noise threshold. Changes strictly smaller than this are ignored.
pub const DEFAULT_THRESHOLD: u32 = 2;

/// Tuning for [`ResizeAggregator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    /// Batching window, measured from the first sample of a batch.
    pub debounce: Duration,
    /// Minimum absolute change worth reporting.
    pub threshold: u32,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// One flushed size change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeReport {
    /// The node that changed.
    pub node: NodeId,
    /// Logical index the node was observed with.
    pub index: usize,
    /// New absolute height (not a delta).
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    index: usize,
    last_height: u32,
}

/// Batches size changes of observed nodes.
#[derive(Debug)]
pub struct ResizeAggregator {
    options: ResizeOptions,
    tracked: HashMap<NodeId, Tracked>,
    // Insertion order of pending nodes, so flushes report in arrival order.
    pending_order: Vec<NodeId>,
    pending: HashMap<NodeId, u32>,
    deadline: Option<Instant>,
}

impl ResizeAggregator {
    /// Create an aggregator.
    pub fn new(options: ResizeOptions) -> Self {
        Self {
            options,
            tracked: HashMap::new(),
            pending_order: Vec::new(),
            pending: HashMap::new(),
            deadline: None,
        }
    }

    /// Start tracking `node` under `index`, with `baseline` as its last known height.
    ///
    /// Re-observing a node rebinds its index and baseline.
    pub fn observe(&mut self, node: NodeId, index: usize, baseline: u32) {
        self.tracked.insert(
            node,
            Tracked {
                index,
                last_height: baseline,
            },
        );
    }

    /// Stop tracking `node` and discard its pending sample. No-op when untracked.
    pub fn unobserve(&mut self, node: NodeId) {
        self.tracked.remove(&node);
        self.drop_pending(node);
    }

    /// Stop tracking every node and cancel the scheduled flush.
    pub fn disconnect(&mut self) {
        self.tracked.clear();
        self.pending.clear();
        self.pending_order.clear();
        self.deadline = None;
    }

    /// Whether `node` is tracked.
    pub fn is_observed(&self, node: NodeId) -> bool {
        self.tracked.contains_key(&node)
    }

    /// Number of tracked nodes.
    pub fn observed_count(&self) -> usize {
        self.tracked.len()
    }

    /// Number of nodes with a queued sample.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Feed one size sample observed at `now`.
    ///
    /// Samples for untracked nodes are ignored. The first sample of a batch
    /// schedules the flush deadline, whether or not it is queued.
    pub fn record(&mut self, node: NodeId, height: u32, now: Instant) {
        let Some(tracked) = self.tracked.get(&node) else {
            trace!(target: "vtimeline::resize", %node, "sample for untracked node ignored");
            return;
        };
        let noise = tracked.last_height.abs_diff(height) < self.options.threshold;

        if self.deadline.is_none() {
            self.deadline = Some(now + self.options.debounce);
        }

        if noise {
            // The node settled back near its reported height; nothing to say.
            if self.pending.remove(&node).is_some() {
                self.pending_order.retain(|n| *n != node);
            }
            return;
        }

        if self.pending.insert(node, height).is_none() {
            self.pending_order.push(node);
        }
    }

    /// Move the baseline of `node` to `height` without reporting it.
    ///
    /// Used when the owner applied a height by other means. Discards any
    /// pending sample for the node. No-op when untracked.
    pub fn rebase(&mut self, node: NodeId, height: u32) {
        if let Some(tracked) = self.tracked.get_mut(&node) {
            tracked.last_height = height;
            self.drop_pending(node);
        }
    }

    /// When the pending batch becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Release the pending batch if its deadline has passed.
    ///
    /// Each node appears at most once, carrying its latest height. Reported
    /// heights become the new baselines.
    pub fn flush_due(&mut self, now: Instant) -> Vec<ResizeReport> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.flush(),
            _ => Vec::new(),
        }
    }

    /// Release the pending batch unconditionally.
    pub fn flush(&mut self) -> Vec<ResizeReport> {
        self.deadline = None;
        let order = std::mem::take(&mut self.pending_order);
        let mut pending = std::mem::take(&mut self.pending);

        let mut reports = Vec::with_capacity(order.len());
        for node in order {
            let Some(height) = pending.remove(&node) else {
                continue;
            };
            let Some(tracked) = self.tracked.get_mut(&node) else {
                continue;
            };
            debug!(
                target: "vtimeline::resize",
                index = tracked.index,
                from = tracked.last_height,
                to = height,
                "height changed (debounced)"
            );
            tracked.last_height = height;
            reports.push(ResizeReport {
                node,
                index: tracked.index,
                height,
            });
        }
        reports
    }

    fn drop_pending(&mut self, node: NodeId) {
        if self.pending.remove(&node).is_some() {
            self.pending_order.retain(|n| *n != node);
        }
        if self.pending.is_empty() {
            self.deadline = None;
        }
    }
}

impl Default for ResizeAggregator {
    fn default() -> Self {
        Self::new(ResizeOptions::default())
    }
}
