//! Domain-level keyboard actions independent of key bindings.

/// What a key press asks the feed viewer to do.
///
/// These represent user intent, not specific keys. The mapping from
/// `crossterm::event::KeyEvent` lives in `crate::view::keys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    // Scrolling
    /// Scroll up by one row. Default: k/↑
    ScrollUp,
    /// Scroll down by one row. Default: j/↓
    ScrollDown,
    /// Scroll up by one viewport. Default: Ctrl+u/Page Up
    PageUp,
    /// Scroll down by one viewport. Default: Ctrl+d/Page Down/Space
    PageDown,
    /// Jump to the first post. Default: g/Home
    ScrollToTop,
    /// Jump to the end of the scrollable area. Default: G/End
    ScrollToBottom,

    // Feed
    /// Show the next category. Default: c
    NextCategory,
    /// Show the previous category. Default: C
    PrevCategory,
    /// Reload the feed from its first page. Default: r
    Reload,

    // Application
    /// Quit. Default: q/Esc/Ctrl+c
    Quit,
}
