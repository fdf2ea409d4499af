//! Card and status bar styling.

use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Configuration for color output.
///
/// Determines whether colors should be enabled or disabled based on:
/// - `--no-color` CLI flag
/// - `NO_COLOR` environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Create a ColorConfig from CLI args and environment.
    ///
    /// Priority (first match wins):
    /// 1. `--no-color` flag (disables colors)
    /// 2. `NO_COLOR` env var (any value disables colors)
    /// 3. Default: colors enabled
    pub fn from_env_and_args(no_color_flag: bool) -> Self {
        let enabled = !no_color_flag && std::env::var("NO_COLOR").is_err();
        Self { enabled }
    }

    /// Colors forced on or off.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

// ===== CardStyles =====

/// Styles of the parts of a post card and the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardStyles {
    /// Author name in the card header.
    pub author: Style,
    /// Timestamp in the card header.
    pub timestamp: Style,
    /// Body text.
    pub body: Style,
    /// Like counter and category in the footer.
    pub footer: Style,
    /// Idle status bar.
    pub status: Style,
    /// Status bar while a page is loading.
    pub status_busy: Style,
}

impl CardStyles {
    /// Styles for `config`.
    ///
    /// If colors are disabled, only text modifiers remain.
    pub fn with_color_config(config: ColorConfig) -> Self {
        if config.colors_enabled() {
            Self {
                author: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                timestamp: Style::default().fg(Color::DarkGray),
                body: Style::default(),
                footer: Style::default().fg(Color::Yellow),
                status: Style::default().fg(Color::Gray),
                status_busy: Style::default().fg(Color::Green),
            }
        } else {
            Self {
                author: Style::default().add_modifier(Modifier::BOLD),
                timestamp: Style::default(),
                body: Style::default(),
                footer: Style::default(),
                status: Style::default(),
                status_busy: Style::default().add_modifier(Modifier::BOLD),
            }
        }
    }
}

impl Default for CardStyles {
    fn default() -> Self {
        Self::with_color_config(ColorConfig::from_env_and_args(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_colors_carry_no_foreground() {
        let styles = CardStyles::with_color_config(ColorConfig::new(false));
        assert_eq!(styles.author.fg, None);
        assert_eq!(styles.footer.fg, None);
        assert_eq!(styles.status_busy.fg, None);
    }

    #[test]
    fn enabled_colors_distinguish_author_and_footer() {
        let styles = CardStyles::with_color_config(ColorConfig::new(true));
        assert_eq!(styles.author.fg, Some(Color::Cyan));
        assert_eq!(styles.footer.fg, Some(Color::Yellow));
        assert_ne!(styles.status, styles.status_busy);
    }
}
