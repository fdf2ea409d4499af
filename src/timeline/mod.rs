//! Virtualized timeline engine.
//!
//! Leaf-first:
//! - [`cache`]: bounded item cache for id lookups
//! - [`resize`]: debounced size-change aggregation
//! - [`cell`]: one row's node, offset and height
//! - [`manager`]: ordered cells, layout and page fetching
//! - [`scroller`]: viewport windowing and scroll-driven pagination
//!
//! The engine is host-agnostic: it drives a [`Surface`] and builds node
//! content through a [`Renderer`]. [`headless`] provides a deterministic
//! host for tests; the terminal front end lives in `crate::view`.

pub mod cache;
pub mod cell;
pub mod headless;
pub mod manager;
pub mod resize;
pub mod scroller;
pub mod surface;

pub use cache::{BoundedCache, CacheStats, EvictionPolicy};
pub use cell::{Cell, SettlePolicy};
pub use manager::{PageOutcome, PageRequest, PageTicket, TimelineManager, TimelineOptions};
pub use resize::{ResizeAggregator, ResizeOptions, ResizeReport};
pub use scroller::{visible_range, ScrollOutcome, VirtualScroller};
pub use surface::{ListenerId, NodeId, Placement, Renderer, Surface, Viewport};
