//! Status bar widget.

use super::styles::CardStyles;
use crate::timeline::CacheStats;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Line,
    widgets::{Paragraph, Widget},
};

const KEY_HINTS: &str = "q quit · j/k scroll · c category · r reload";

/// What the status bar reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusInfo<'a> {
    /// Active category, `None` for all posts.
    pub category: Option<&'a str>,
    /// Posts loaded so far.
    pub loaded: usize,
    /// A page request is outstanding.
    pub loading: bool,
    /// The feed ran dry.
    pub exhausted: bool,
    /// First visible row.
    pub scroll_top: u32,
    /// Scrollable height.
    pub content_height: u32,
    /// Author of the post picked with the mouse.
    pub selected: Option<&'a str>,
    /// Last fetch failure.
    pub error: Option<&'a str>,
    /// Post lookup cache, shown once it has been queried.
    pub cache: Option<CacheStats>,
}

/// Plain-text status line for `info`.
pub fn status_text(info: &StatusInfo<'_>) -> String {
    let category = info.category.map_or_else(|| "all".to_string(), |c| format!("#{c}"));
    let mut text = format!(
        " {category} · {} posts · row {}/{}",
        info.loaded, info.scroll_top, info.content_height
    );
    if info.loading {
        text.push_str(" · loading…");
    } else if info.exhausted {
        text.push_str(" · end of feed");
    }
    if let Some(author) = info.selected {
        text.push_str(" · selected @");
        text.push_str(author);
    }
    if let Some(error) = info.error {
        text.push_str(" · error: ");
        text.push_str(error);
    }
    if let Some(cache) = info.cache.filter(|c| c.hits + c.misses > 0) {
        text.push_str(&format!(
            " · cache {}/{} {:.0}% hit",
            cache.size,
            cache.capacity,
            cache.hit_rate()
        ));
    }
    text.push_str(" | ");
    text.push_str(KEY_HINTS);
    text
}

/// One-line status bar.
pub struct StatusBar<'a> {
    info: StatusInfo<'a>,
    styles: CardStyles,
}

impl<'a> StatusBar<'a> {
    /// Status bar showing `info`.
    pub fn new(info: StatusInfo<'a>, styles: CardStyles) -> Self {
        Self { info, styles }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = if self.info.loading {
            self.styles.status_busy
        } else {
            self.styles.status
        };
        Paragraph::new(Line::from(status_text(&self.info)))
            .style(style)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_status_shows_category_and_counts() {
        let info = StatusInfo {
            category: Some("rust"),
            loaded: 12,
            scroll_top: 30,
            content_height: 400,
            ..StatusInfo::default()
        };
        let text = status_text(&info);
        assert!(text.starts_with(" #rust · 12 posts · row 30/400 |"), "got: {text}");
    }

    #[test]
    fn loading_wins_over_exhausted() {
        let info = StatusInfo {
            loading: true,
            exhausted: true,
            ..StatusInfo::default()
        };
        let text = status_text(&info);
        assert!(text.contains("loading"));
        assert!(!text.contains("end of feed"));
    }

    #[test]
    fn exhausted_feed_is_reported() {
        let info = StatusInfo {
            exhausted: true,
            ..StatusInfo::default()
        };
        assert!(status_text(&info).contains("all · 0 posts · row 0/0 · end of feed"));
    }

    #[test]
    fn selection_and_error_are_appended() {
        let info = StatusInfo {
            selected: Some("ferris"),
            error: Some("offline"),
            ..StatusInfo::default()
        };
        let text = status_text(&info);
        assert!(text.contains("selected @ferris"));
        assert!(text.contains("error: offline"));
    }

    #[test]
    fn cache_stats_appear_after_first_lookup() {
        let mut stats = CacheStats {
            size: 5,
            capacity: 8,
            hits: 0,
            misses: 0,
        };
        let info = StatusInfo {
            cache: Some(stats),
            ..StatusInfo::default()
        };
        assert!(!status_text(&info).contains("cache"));

        stats.hits = 1;
        stats.misses = 1;
        let info = StatusInfo {
            cache: Some(stats),
            ..StatusInfo::default()
        };
        assert!(status_text(&info).contains(" · cache 5/8 50% hit |"));
    }
}
