//! Host seams of the timeline engine.
//!
//! The engine never touches a concrete UI toolkit. It talks to:
//! - a [`Surface`]: the scrollable host container plus the ambient viewport
//! - a [`Renderer`]: turns one item into the surface's node content
//!
//! Nodes are opaque [`NodeId`] handles owned by the surface.

use std::fmt;

/// Handle to a node created by a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw handle. Surfaces allocate these.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle to a registered scroll listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw handle. Surfaces allocate these.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Where an attached node goes in the container's child order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Insert immediately before an attached node.
    Before(NodeId),
    /// Append after the last child.
    Append,
}

/// Scroll position and visible height, in surface units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Distance from the top of the content to the top of the viewport.
    pub scroll_top: u32,
    /// Visible height.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(scroll_top: u32, height: u32) -> Self {
        Self { scroll_top, height }
    }
}

/// The scrollable host container.
///
/// Attached nodes are positioned absolutely: `attach` and `set_offset` place
/// a node's top edge at `offset` without reflowing siblings.
pub trait Surface {
    /// What a node is built from.
    type Content;

    /// Create a detached node.
    fn create_node(&mut self, content: Self::Content) -> NodeId;

    /// Attach `node` at `offset`. Attaching an attached node only moves it.
    fn attach(&mut self, node: NodeId, offset: u32, placement: Placement);

    /// Detach `node`, keeping it alive for reuse. No-op when detached.
    fn detach(&mut self, node: NodeId);

    /// Whether `node` is currently attached.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Move an attached node's top edge to `offset`.
    fn set_offset(&mut self, node: NodeId, offset: u32);

    /// Sample the node's current rendered height.
    ///
    /// Sampling may force layout, hence `&mut self`.
    fn measure(&mut self, node: NodeId) -> u32;

    /// Set the total scrollable height, or clear it with `None`.
    fn set_content_height(&mut self, height: Option<u32>);

    /// Drop every node.
    fn clear(&mut self);

    /// Current scroll position and visible height.
    fn viewport(&self) -> Viewport;

    /// Register interest in scroll events.
    fn add_scroll_listener(&mut self) -> ListenerId;

    /// Remove a scroll listener. No-op for unknown ids.
    fn remove_scroll_listener(&mut self, listener: ListenerId);

    /// Size changes of attached nodes since the last call.
    ///
    /// Each entry carries the node's new height.
    fn take_size_changes(&mut self) -> Vec<(NodeId, u32)>;
}

/// Builds node content for one item.
pub trait Renderer<T> {
    /// Content type understood by the target surface.
    type Content;

    /// Render `item`. Called at most once per cell.
    fn render(&mut self, item: &T) -> Self::Content;
}
