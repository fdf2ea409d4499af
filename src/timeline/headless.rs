//! Deterministic in-memory host for tests and benchmarks.
//!
//! [`HeadlessSurface`] keeps attached nodes in child order, records offsets,
//! and answers `measure` from a scripted sequence of samples so settle and
//! resize behavior can be driven precisely.

use super::surface::{ListenerId, NodeId, Placement, Renderer, Surface, Viewport};
use std::collections::HashMap;

/// Scripted node content: successive `measure` samples.
///
/// Once the script runs out, the last sample repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessContent {
    samples: Vec<u32>,
}

impl HeadlessContent {
    /// Content whose height never changes.
    pub fn fixed(height: u32) -> Self {
        Self {
            samples: vec![height],
        }
    }

    /// Content that reports `samples` in order, then keeps the last one.
    ///
    /// An empty script measures as 0.
    pub fn settling(samples: impl Into<Vec<u32>>) -> Self {
        Self {
            samples: samples.into(),
        }
    }
}

#[derive(Debug)]
struct HeadlessNode {
    samples: Vec<u32>,
    cursor: usize,
    forced: Option<u32>,
    offset: u32,
    attached: bool,
}

impl HeadlessNode {
    fn sample(&mut self) -> u32 {
        if let Some(height) = self.forced {
            return height;
        }
        let Some(last) = self.samples.len().checked_sub(1) else {
            return 0;
        };
        let height = self.samples[self.cursor.min(last)];
        self.cursor = (self.cursor + 1).min(last);
        height
    }
}

/// In-memory [`Surface`].
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    nodes: HashMap<NodeId, HeadlessNode>,
    order: Vec<NodeId>,
    next_node: u64,
    nodes_created: usize,
    viewport: Viewport,
    content_height: Option<u32>,
    listeners: Vec<ListenerId>,
    next_listener: u64,
    listener_removals: usize,
    size_changes: Vec<(NodeId, u32)>,
}

impl HeadlessSurface {
    /// Create a surface with a viewport of `height` scrolled to the top.
    pub fn new(height: u32) -> Self {
        Self {
            viewport: Viewport::new(0, height),
            ..Self::default()
        }
    }

    /// Scroll to `scroll_top`.
    pub fn scroll_to(&mut self, scroll_top: u32) {
        self.viewport.scroll_top = scroll_top;
    }

    /// Change the visible height.
    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport.height = height;
    }

    /// Force a node to a new height, as a layout change would.
    ///
    /// Attached nodes queue a size change for [`Surface::take_size_changes`].
    pub fn set_node_height(&mut self, node: NodeId, height: u32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.forced = Some(height);
            if n.attached {
                self.size_changes.push((node, height));
            }
        }
    }

    /// Attached nodes in child order.
    pub fn attached(&self) -> &[NodeId] {
        &self.order
    }

    /// Recorded offset of `node`.
    pub fn offset_of(&self, node: NodeId) -> Option<u32> {
        self.nodes.get(&node).map(|n| n.offset)
    }

    /// Last value passed to [`Surface::set_content_height`].
    pub fn content_height(&self) -> Option<u32> {
        self.content_height
    }

    /// Total nodes ever created.
    pub fn nodes_created(&self) -> usize {
        self.nodes_created
    }

    /// Registered scroll listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Successful listener removals.
    pub fn listener_removals(&self) -> usize {
        self.listener_removals
    }
}

impl Surface for HeadlessSurface {
    type Content = HeadlessContent;

    fn create_node(&mut self, content: HeadlessContent) -> NodeId {
        let id = NodeId::new(self.next_node);
        self.next_node += 1;
        self.nodes_created += 1;
        self.nodes.insert(
            id,
            HeadlessNode {
                samples: content.samples,
                cursor: 0,
                forced: None,
                offset: 0,
                attached: false,
            },
        );
        id
    }

    fn attach(&mut self, node: NodeId, offset: u32, placement: Placement) {
        let Some(n) = self.nodes.get_mut(&node) else {
            return;
        };
        n.offset = offset;
        if n.attached {
            return;
        }
        n.attached = true;

        let position = match placement {
            Placement::Before(anchor) => self.order.iter().position(|id| *id == anchor),
            Placement::Append => None,
        };
        match position {
            Some(i) => self.order.insert(i, node),
            None => self.order.push(node),
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if n.attached {
                n.attached = false;
                self.order.retain(|id| *id != node);
            }
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.attached)
    }

    fn set_offset(&mut self, node: NodeId, offset: u32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.offset = offset;
        }
    }

    fn measure(&mut self, node: NodeId) -> u32 {
        self.nodes.get_mut(&node).map_or(0, HeadlessNode::sample)
    }

    fn set_content_height(&mut self, height: Option<u32>) {
        self.content_height = height;
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.size_changes.clear();
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn add_scroll_listener(&mut self) -> ListenerId {
        let id = ListenerId::new(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(id);
        id
    }

    fn remove_scroll_listener(&mut self, listener: ListenerId) {
        let before = self.listeners.len();
        self.listeners.retain(|l| *l != listener);
        if self.listeners.len() < before {
            self.listener_removals += 1;
        }
    }

    fn take_size_changes(&mut self) -> Vec<(NodeId, u32)> {
        std::mem::take(&mut self.size_changes)
    }
}

/// [`Renderer`] backed by a closure, counting invocations.
pub struct HeadlessRenderer<F> {
    render: F,
    calls: usize,
}

impl<F> HeadlessRenderer<F> {
    /// Wrap `render`.
    pub fn new(render: F) -> Self {
        Self { render, calls: 0 }
    }

    /// How many times `render` ran.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl<T, F> Renderer<T> for HeadlessRenderer<F>
where
    F: FnMut(&T) -> HeadlessContent,
{
    type Content = HeadlessContent;

    fn render(&mut self, item: &T) -> HeadlessContent {
        self.calls += 1;
        (self.render)(item)
    }
}
