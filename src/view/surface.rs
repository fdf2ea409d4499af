//! Terminal host for the timeline engine.
//!
//! One surface unit is one terminal row. Nodes are post cards wrapped to
//! the surface width; a width change re-wraps them and reports the new
//! heights through [`Surface::take_size_changes`], the same path a
//! browser's resize observer would take.

use super::card::CardContent;
use crate::timeline::{ListenerId, NodeId, Placement, Surface, Viewport};
use ratatui::{buffer::Buffer, layout::Rect, text::Line, widgets::Widget};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug)]
struct TerminalNode {
    content: CardContent,
    rows: Vec<Line<'static>>,
    wrapped_at: u16,
    offset: u32,
    attached: bool,
}

impl TerminalNode {
    fn height(&self) -> u32 {
        u32::try_from(self.rows.len()).unwrap_or(u32::MAX)
    }

    /// Re-wrap for `width`. Returns the new height when it changed.
    fn rewrap(&mut self, width: u16) -> Option<u32> {
        if self.wrapped_at == width {
            return None;
        }
        let before = self.height();
        self.rows = self.content.wrap(width);
        self.wrapped_at = width;
        let after = self.height();
        (after != before).then_some(after)
    }

    fn covers(&self, row: u32) -> bool {
        row >= self.offset && row - self.offset < self.height()
    }
}

/// [`Surface`] drawing post cards into a ratatui buffer.
#[derive(Debug)]
pub struct TerminalSurface {
    nodes: HashMap<NodeId, TerminalNode>,
    order: Vec<NodeId>,
    next_node: u64,
    width: u16,
    viewport: Viewport,
    content_height: Option<u32>,
    listeners: Vec<ListenerId>,
    next_listener: u64,
    size_changes: Vec<(NodeId, u32)>,
}

impl TerminalSurface {
    /// Surface of `width` columns showing `height` rows.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            next_node: 0,
            width: width.max(1),
            viewport: Viewport::new(0, u32::from(height)),
            content_height: None,
            listeners: Vec::new(),
            next_listener: 0,
            size_changes: Vec::new(),
        }
    }

    /// Adopt a new text area size.
    ///
    /// A width change re-wraps every attached card and queues the ones
    /// whose row count changed. Detached cards re-wrap when attached again.
    pub fn set_size(&mut self, width: u16, height: u16) {
        let width = width.max(1);
        self.viewport.height = u32::from(height);
        if width != self.width {
            self.width = width;
            for id in &self.order {
                if let Some(height) = self.nodes.get_mut(id).and_then(|n| n.rewrap(width)) {
                    self.size_changes.push((*id, height));
                }
            }
            trace!(target: "vtimeline::scroll", width, queued = self.size_changes.len(), "surface re-wrapped");
        }
        self.clamp_scroll();
    }

    /// Width in columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Largest valid scroll position.
    pub fn max_scroll(&self) -> u32 {
        self.content_height
            .unwrap_or(0)
            .saturating_sub(self.viewport.height)
    }

    /// Scroll to `scroll_top`, clamped. Returns whether the position moved.
    pub fn scroll_to(&mut self, scroll_top: u32) -> bool {
        let target = scroll_top.min(self.max_scroll());
        let moved = target != self.viewport.scroll_top;
        self.viewport.scroll_top = target;
        moved
    }

    /// Scroll by `delta` rows, clamped. Returns whether the position moved.
    pub fn scroll_by(&mut self, delta: i64) -> bool {
        let target = (i64::from(self.viewport.scroll_top) + delta).clamp(0, i64::from(u32::MAX));
        self.scroll_to(u32::try_from(target).unwrap_or(u32::MAX))
    }

    /// Scroll to the bottom of the content.
    pub fn scroll_to_end(&mut self) -> bool {
        self.scroll_to(self.max_scroll())
    }

    /// Attached node drawn at viewport row `row`, if any.
    pub fn node_at_row(&self, row: u16) -> Option<NodeId> {
        let y = self.viewport.scroll_top.saturating_add(u32::from(row));
        self.order
            .iter()
            .copied()
            .find(|id| self.nodes.get(id).is_some_and(|n| n.covers(y)))
    }

    /// Attached nodes in child order.
    pub fn attached(&self) -> &[NodeId] {
        &self.order
    }

    /// Last value passed to [`Surface::set_content_height`].
    pub fn content_height(&self) -> Option<u32> {
        self.content_height
    }

    /// Registered scroll listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Nodes alive on the surface, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn clamp_scroll(&mut self) {
        self.viewport.scroll_top = self.viewport.scroll_top.min(self.max_scroll());
    }
}

impl Surface for TerminalSurface {
    type Content = CardContent;

    fn create_node(&mut self, content: CardContent) -> NodeId {
        let id = NodeId::new(self.next_node);
        self.next_node += 1;
        let rows = content.wrap(self.width);
        self.nodes.insert(
            id,
            TerminalNode {
                content,
                rows,
                wrapped_at: self.width,
                offset: 0,
                attached: false,
            },
        );
        id
    }

    fn attach(&mut self, node: NodeId, offset: u32, placement: Placement) {
        let width = self.width;
        let Some(n) = self.nodes.get_mut(&node) else {
            return;
        };
        n.offset = offset;
        if n.attached {
            return;
        }
        n.attached = true;
        if let Some(height) = n.rewrap(width) {
            self.size_changes.push((node, height));
        }

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
        let width = self.width;
        self.nodes.get_mut(&node).map_or(0, |n| {
            n.rewrap(width);
            n.height()
        })
    }

    fn set_content_height(&mut self, height: Option<u32>) {
        self.content_height = height;
        self.clamp_scroll();
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
        self.listeners.retain(|id| *id != listener);
    }

    fn take_size_changes(&mut self) -> Vec<(NodeId, u32)> {
        std::mem::take(&mut self.size_changes)
    }
}

/// Draws the attached cards of a [`TerminalSurface`] that fall inside
/// the viewport.
pub struct TimelineView<'a> {
    surface: &'a TerminalSurface,
}

impl<'a> TimelineView<'a> {
    /// View over `surface`.
    pub fn new(surface: &'a TerminalSurface) -> Self {
        Self { surface }
    }
}

impl Widget for TimelineView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let top = self.surface.viewport.scroll_top;
        let bottom = top.saturating_add(u32::from(area.height));

        for id in &self.surface.order {
            let Some(node) = self.surface.nodes.get(id) else {
                continue;
            };
            for (i, row) in node.rows.iter().enumerate() {
                let y = node.offset.saturating_add(u32::try_from(i).unwrap_or(u32::MAX));
                if y < top {
                    continue;
                }
                if y >= bottom {
                    break;
                }
                // y - top < area.height, so it fits in u16
                let screen_y = area.y + (y - top) as u16;
                buf.set_line(area.x, screen_y, row, area.width);
            }
        }
    }
}
