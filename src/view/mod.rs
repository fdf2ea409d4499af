//! Terminal front end (impure shell).
//!
//! Hosts the timeline engine in a terminal: [`TerminalSurface`] is the
//! scroll container, [`PostRenderer`] builds post cards, and [`TuiApp`]
//! runs the event loop that feeds scrolls, resizes and page completions
//! back into the engine.

pub mod card;
pub mod keys;
pub mod render;
pub mod styles;
pub mod surface;

pub use card::{CardContent, PostRenderer};
pub use render::{StatusBar, StatusInfo};
pub use styles::{CardStyles, ColorConfig};
pub use surface::{TerminalSurface, TimelineView};

use crate::config::ResolvedConfig;
use crate::model::{
    ConfigurationError, FetchError, InputError, KeyAction, Post, PostId, TimelineError,
};
use crate::source::JsonlFeed;
use crate::timeline::{
    BoundedCache, EvictionPolicy, PageOutcome, PageRequest, PageTicket, Surface, TimelineManager,
    TimelineOptions, VirtualScroller,
};
use crossterm::{
    event::{Event, EventStream, MouseButton, MouseEvent, MouseEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Size},
    Terminal,
};
use std::io::{self, Stdout};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rows taken by the status bar.
const STATUS_HEIGHT: u16 = 1;

/// Rows scrolled per mouse wheel notch.
const WHEEL_STEP: i64 = 3;

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Feed file error
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Timeline error
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Invalid engine or cache settings
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Settings of a [`TuiApp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppOptions {
    /// Engine tuning.
    pub timeline: TimelineOptions,
    /// Rows kept mounted above and below the viewport.
    pub overscan: u32,
    /// Capacity of the post lookup cache.
    pub cache_capacity: usize,
    /// Eviction policy of the post lookup cache.
    pub cache_policy: EvictionPolicy,
    /// Category shown at startup.
    pub category: Option<String>,
    /// Color output.
    pub colors: ColorConfig,
}

impl AppOptions {
    /// Options from resolved configuration.
    pub fn from_config(config: &ResolvedConfig, colors: ColorConfig) -> Self {
        Self {
            timeline: config.timeline_options(),
            overscan: config.overscan,
            cache_capacity: config.cache_capacity,
            cache_policy: config.cache_policy,
            category: config.category.clone(),
            colors,
        }
    }
}

/// Timeline of posts hosted in the terminal.
pub type FeedTimeline = TimelineManager<TerminalSurface, PostRenderer, JsonlFeed>;

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: Backend,
{
    terminal: Terminal<B>,
    timeline: FeedTimeline,
    scroller: VirtualScroller,
    /// Page fetch started by the scroller, polled by the event loop
    pending: Option<PageRequest<Post>>,
    /// Posts by id, for mouse selection
    posts: BoundedCache<PostId, Post>,
    /// `None` (all posts) followed by the feed's categories
    categories: Vec<Option<String>>,
    category_index: usize,
    selected: Option<Post>,
    last_error: Option<String>,
    styles: CardStyles,
    initial_category: Option<String>,
}

impl TuiApp<CrosstermBackend<Stdout>> {
    /// Create and initialize a new TUI application
    ///
    /// Sets up terminal in raw mode with alternate screen
    pub fn new(feed: JsonlFeed, options: AppOptions) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(crossterm::event::EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Self::with_terminal(terminal, feed, options)
    }
}

impl<B> TuiApp<B>
where
    B: Backend,
{
    /// Build the application on an already prepared terminal.
    ///
    /// Nothing is loaded until [`Self::start`].
    pub fn with_terminal(
        terminal: Terminal<B>,
        feed: JsonlFeed,
        options: AppOptions,
    ) -> Result<Self, TuiError> {
        let (width, height) = text_size(terminal.size()?);
        let styles = CardStyles::with_color_config(options.colors);

        let mut categories: Vec<Option<String>> = vec![None];
        categories.extend(feed.categories().into_iter().map(Some));
        if options.category.is_some() && !categories.contains(&options.category) {
            categories.push(options.category.clone());
        }

        let mut timeline = TimelineManager::new(
            TerminalSurface::new(width, height),
            PostRenderer::new(styles),
            feed,
            options.timeline,
        )?;
        let scroller = VirtualScroller::new(&mut timeline, options.overscan);
        let posts = BoundedCache::with_policy(options.cache_capacity, options.cache_policy)?;

        Ok(Self {
            terminal,
            timeline,
            scroller,
            pending: None,
            posts,
            categories,
            category_index: 0,
            selected: None,
            last_error: None,
            styles,
            initial_category: options.category,
        })
    }

    /// Load the first page of the startup category and mount it.
    pub async fn start(&mut self) -> Result<(), TuiError> {
        let category = self.initial_category.take();
        self.category_index = self
            .categories
            .iter()
            .position(|c| *c == category)
            .unwrap_or(0);
        self.timeline.source_mut().set_category(category);
        self.reload().await?;
        self.refresh_window();
        Ok(())
    }

    /// Run the main event loop
    ///
    /// Returns when user quits (q or Ctrl+C). Multiplexes terminal events,
    /// the outstanding page fetch, and the resize flush deadline; redraws
    /// only after one of them fires.
    pub async fn run(&mut self) -> Result<(), TuiError> {
        let mut events = EventStream::new();
        self.draw()?;

        loop {
            let deadline = self.timeline.next_resize_deadline();
            tokio::select! {
                biased;

                event = events.next() => match event {
                    Some(Ok(event)) => {
                        if self.handle_event(event).await? {
                            return Ok(()); // User quit
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                },

                (ticket, result) = next_page(&mut self.pending) => {
                    self.handle_page(ticket, result).await?;
                }

                _ = resize_deadline(deadline), if deadline.is_some() => {
                    let applied = self.timeline.flush_resizes(Instant::now());
                    debug!(target: "vtimeline::resize", applied, "resize flush");
                }
            }

            self.refresh_window();
            self.draw()?;
        }
    }

    /// Handle one terminal event. Returns true if app should quit.
    async fn handle_event(&mut self, event: Event) -> Result<bool, TuiError> {
        match event {
            Event::Key(key) => match keys::key_action(&key) {
                Some(action) => self.apply(action).await,
                None => Ok(false),
            },
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Ok(false)
            }
            Event::Resize(width, height) => {
                self.handle_resize(width, height);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    async fn apply(&mut self, action: KeyAction) -> Result<bool, TuiError> {
        let page = i64::from(self.timeline.surface().viewport().height.max(1));
        match action {
            KeyAction::Quit => return Ok(true),
            KeyAction::ScrollDown => {
                self.timeline.surface_mut().scroll_by(1);
            }
            KeyAction::ScrollUp => {
                self.timeline.surface_mut().scroll_by(-1);
            }
            KeyAction::PageDown => {
                self.timeline.surface_mut().scroll_by(page);
            }
            KeyAction::PageUp => {
                self.timeline.surface_mut().scroll_by(-page);
            }
            KeyAction::ScrollToTop => {
                self.timeline.surface_mut().scroll_to(0);
            }
            KeyAction::ScrollToBottom => {
                self.timeline.surface_mut().scroll_to_end();
            }
            KeyAction::NextCategory => self.cycle_category(true).await?,
            KeyAction::PrevCategory => self.cycle_category(false).await?,
            KeyAction::Reload => self.reload().await?,
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                self.timeline.surface_mut().scroll_by(WHEEL_STEP);
            }
            MouseEventKind::ScrollUp => {
                self.timeline.surface_mut().scroll_by(-WHEEL_STEP);
            }
            MouseEventKind::Down(MouseButton::Left) => self.select_at(mouse.row),
            _ => {}
        }
    }

    fn handle_resize(&mut self, width: u16, height: u16) {
        debug!("Handling resize to {}x{}", width, height);
        let (width, height) = text_size(Size { width, height });
        self.timeline.surface_mut().set_size(width, height);
    }

    /// Pick the post drawn at viewport row `row`.
    fn select_at(&mut self, row: u16) {
        let surface = self.timeline.surface();
        if u32::from(row) >= surface.viewport().height {
            return; // Status bar
        }
        let Some(node) = surface.node_at_row(row) else {
            self.selected = None;
            return;
        };
        let mounted = self
            .timeline
            .cells()
            .get(self.scroller.mounted_range())
            .unwrap_or_default();
        let Some(cell) = mounted.iter().find(|c| c.node() == Some(node)) else {
            return;
        };

        let id = cell.data().id.clone();
        let cached = self.posts.get(&id).cloned();
        let post = match cached {
            Some(post) => post,
            None => {
                let post = cell.data().clone();
                self.posts.set(id, post.clone());
                post
            }
        };
        debug!(post = %post.id, author = %post.author, "post selected");
        self.selected = Some(post);
    }

    async fn cycle_category(&mut self, forward: bool) -> Result<(), TuiError> {
        let count = self.categories.len();
        self.category_index = if forward {
            (self.category_index + 1) % count
        } else {
            (self.category_index + count - 1) % count
        };
        let category = self.categories[self.category_index].clone();
        info!(category = ?category, "switching category");

        self.timeline.dispose();
        self.timeline.source_mut().set_category(category);
        // Posts of the previous category are the least likely to be picked
        let trimmed = self.posts.trim(None);
        self.posts.reset_stats();
        debug!(trimmed, cached = self.posts.len(), "post cache trimmed");
        self.reload().await
    }

    /// Drop everything and load the first page again.
    ///
    /// An in-flight page is abandoned; its ticket belongs to the old
    /// generation anyway.
    async fn reload(&mut self) -> Result<(), TuiError> {
        self.pending = None;
        self.scroller.reset();
        self.selected = None;
        self.last_error = None;
        self.timeline.surface_mut().scroll_to(0);

        let outcome = self.timeline.init_first_page().await;
        self.settle_outcome(outcome)
    }

    async fn handle_page(
        &mut self,
        ticket: PageTicket,
        result: Result<Vec<Post>, FetchError>,
    ) -> Result<(), TuiError> {
        let outcome = self
            .scroller
            .finish_load(&mut self.timeline, ticket, result)
            .await;
        self.settle_outcome(outcome)
    }

    /// Record a page outcome. Fetch failures are shown, not fatal.
    fn settle_outcome(
        &mut self,
        outcome: Result<PageOutcome, TimelineError>,
    ) -> Result<(), TuiError> {
        match outcome {
            Ok(PageOutcome::Appended(count)) => {
                self.last_error = None;
                self.remember_tail(count);
            }
            Ok(PageOutcome::Exhausted) => {
                info!(posts = self.timeline.cells().len(), "end of feed");
            }
            Ok(PageOutcome::Discarded) => {}
            Err(TimelineError::Fetch(e)) => {
                warn!(error = %e, "page fetch failed");
                self.last_error = Some(e.to_string());
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Cache the last `count` posts for id lookups.
    fn remember_tail(&mut self, count: usize) {
        let cells = self.timeline.cells();
        for cell in &cells[cells.len().saturating_sub(count)..] {
            let post = cell.data();
            self.posts.set(post.id.clone(), post.clone());
        }
    }

    /// Feed pending size changes to the engine and re-window.
    fn refresh_window(&mut self) {
        let now = Instant::now();
        self.timeline.poll_size_changes(now);
        let outcome = self.scroller.on_scroll(&mut self.timeline);
        if let Some(request) = outcome.load {
            self.pending = Some(request);
        }
        // Cards remounted after a width change re-wrap on attach
        self.timeline.poll_size_changes(now);
    }

    /// Render the current frame
    fn draw(&mut self) -> Result<(), TuiError> {
        let surface = self.timeline.surface();
        let info = StatusInfo {
            category: self.timeline.source().category(),
            loaded: self.timeline.cells().len(),
            loading: self.scroller.is_loading(),
            exhausted: self.timeline.is_exhausted(),
            scroll_top: surface.viewport().scroll_top,
            content_height: surface.content_height().unwrap_or(0),
            selected: self.selected.as_ref().map(|p| p.author.as_str()),
            error: self.last_error.as_deref(),
            cache: Some(self.posts.stats()),
        };
        let styles = self.styles;

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(0),                // Timeline
                    Constraint::Length(STATUS_HEIGHT), // Status bar
                ])
                .split(frame.area());
            frame.render_widget(TimelineView::new(surface), chunks[0]);
            frame.render_widget(StatusBar::new(info, styles), chunks[1]);
        })?;

        Ok(())
    }
}

/// Timeline area for a terminal of `size`.
fn text_size(size: Size) -> (u16, u16) {
    (size.width.max(1), size.height.saturating_sub(STATUS_HEIGHT))
}

/// Resolve the outstanding page fetch, or wait forever when there is none.
///
/// Cancel safe: an interrupted poll leaves the request in place.
async fn next_page(
    pending: &mut Option<PageRequest<Post>>,
) -> (PageTicket, Result<Vec<Post>, FetchError>) {
    match pending {
        Some(request) => {
            let result = (&mut request.future).await;
            let ticket = request.ticket;
            *pending = None;
            (ticket, result)
        }
        None => std::future::pending().await,
    }
}

async fn resize_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Run the TUI on `feed` until the user quits.
///
/// Handles terminal setup, installs a panic hook that restores the
/// terminal, and always restores it on exit.
///
/// Note: Logging must be initialized by caller before calling this function.
pub async fn run_with_feed(feed: JsonlFeed, options: AppOptions) -> Result<(), TuiError> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let mut app = TuiApp::new(feed, options)?;

    // Run the app and ensure cleanup happens even on error
    let result = match app.start().await {
        Ok(()) => app.run().await,
        Err(e) => Err(e),
    };

    // Always restore terminal state
    restore_terminal()?;

    result
}

/// Restore terminal to normal state
///
/// Disables raw mode, mouse capture, and leaves alternate screen
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(crossterm::event::DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
