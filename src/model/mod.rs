//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod identifiers;
pub mod key_action;
pub mod post;

// Re-export for convenience
pub use error::{ConfigurationError, FetchError, InputError, TimelineError};
pub use identifiers::{CellId, InvalidPostId, PostId};
pub use key_action::KeyAction;
pub use post::Post;
