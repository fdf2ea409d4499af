//! vtimeline
//!
//! A virtualized timeline engine: an append-only list of variable-height
//! rows of which only the rows near the viewport are attached to the host.
//! Ships with a terminal front end that scrolls a JSONL post feed.
//!
//! - [`timeline`]: the engine (cache, resize aggregation, cells, manager, scroller)
//! - [`source`]: paged feed sources
//! - [`view`]: the terminal host (impure shell)
//! - [`config`], [`logging`]: ambient setup for the binary

pub mod config;
pub mod logging;
pub mod model;
pub mod source;
pub mod timeline;
pub mod view;
