//! Post cards: the node content of the terminal timeline.
//!
//! A card is a list of logical lines. The terminal surface wraps them to
//! the current width, so a card's height is its wrapped row count.

use super::styles::CardStyles;
use crate::model::Post;
use crate::timeline::Renderer;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

const TAB: &str = "    ";

/// Unwrapped lines of one card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardContent {
    lines: Vec<Line<'static>>,
}

impl CardContent {
    /// Card made of `lines`.
    pub fn new(lines: Vec<Line<'static>>) -> Self {
        Self { lines }
    }

    /// Logical lines before wrapping.
    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Rows this card occupies at `width` columns.
    pub fn wrap(&self, width: u16) -> Vec<Line<'static>> {
        self.lines
            .iter()
            .flat_map(|line| wrap_line(line, width))
            .collect()
    }
}

/// Hard-wrap `line` at `width` display columns, keeping span styles.
///
/// Always yields at least one row. A character wider than `width` gets a
/// row of its own.
pub fn wrap_line(line: &Line<'static>, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let mut rows = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut row_width = 0;

    for span in &line.spans {
        let mut text = String::new();
        for ch in span.content.chars() {
            let w = ch.width().unwrap_or(0);
            if row_width + w > width && row_width > 0 {
                if !text.is_empty() {
                    row.push(Span::styled(std::mem::take(&mut text), span.style));
                }
                rows.push(Line::from(std::mem::take(&mut row)).style(line.style));
                row_width = 0;
            }
            text.push(ch);
            row_width += w;
        }
        if !text.is_empty() {
            row.push(Span::styled(text, span.style));
        }
    }
    rows.push(Line::from(row).style(line.style));
    rows
}

/// Builds a [`CardContent`] for each post.
///
/// Layout: header (author and time), body, footer (likes and category),
/// blank separator.
#[derive(Debug, Clone, Default)]
pub struct PostRenderer {
    styles: CardStyles,
    rendered: usize,
}

impl PostRenderer {
    /// Renderer using `styles`.
    pub fn new(styles: CardStyles) -> Self {
        Self {
            styles,
            rendered: 0,
        }
    }

    /// Cards built so far.
    pub fn rendered(&self) -> usize {
        self.rendered
    }
}

impl Renderer<Post> for PostRenderer {
    type Content = CardContent;

    fn render(&mut self, post: &Post) -> CardContent {
        self.rendered += 1;
        let mut lines = Vec::new();

        lines.push(Line::from(vec![
            Span::styled(post.author.clone(), self.styles.author),
            Span::raw(" · "),
            Span::styled(
                post.created_at.format("%Y-%m-%d %H:%M").to_string(),
                self.styles.timestamp,
            ),
        ]));

        for text in post.text.lines() {
            let text = text.trim_end_matches('\r').replace('\t', TAB);
            lines.push(Line::styled(text, self.styles.body));
        }

        let mut footer = format!("♥ {}", post.likes);
        if let Some(category) = &post.category {
            footer.push_str("  #");
            footer.push_str(category);
        }
        lines.push(Line::styled(footer, self.styles.footer));
        lines.push(Line::default());

        CardContent::new(lines)
    }
}
