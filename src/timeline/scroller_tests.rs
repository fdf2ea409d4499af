//! Tests for VirtualScroller and visible_range.

use super::*;
use crate::source::MemoryFeed;
use crate::timeline::cell::SettlePolicy;
use crate::timeline::headless::{HeadlessContent, HeadlessRenderer, HeadlessSurface};
use crate::timeline::manager::TimelineOptions;

type Fixed = fn(&u32) -> HeadlessContent;
type TestManager = TimelineManager<HeadlessSurface, HeadlessRenderer<Fixed>, MemoryFeed<u32>>;

fn fixed(height: &u32) -> HeadlessContent {
    HeadlessContent::fixed(*height)
}

async fn loaded(heights: Vec<u32>, first_page: usize, viewport: u32) -> TestManager {
    let mut m = TimelineManager::new(
        HeadlessSurface::new(viewport),
        HeadlessRenderer::new(fixed as Fixed),
        MemoryFeed::new(heights),
        TimelineOptions {
            first_page_size: first_page,
            page_size: 5,
            settle: SettlePolicy::immediate(),
            ..TimelineOptions::default()
        },
    )
    .unwrap();
    m.init_first_page().await.unwrap();
    m
}

fn mounted_indices(m: &TestManager) -> Vec<usize> {
    m.cells()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_mounted())
        .map(|(i, _)| i)
        .collect()
}

fn assert_attached_in_order(m: &TestManager) {
    let expected: Vec<_> = m
        .cells()
        .iter()
        .filter(|c| c.is_mounted())
        .filter_map(|c| c.node())
        .collect();
    assert_eq!(m.surface().attached(), expected.as_slice());
}

mod visible_range_fn {
    use super::*;

    #[tokio::test]
    async fn empty_cells_give_empty_range() {
        let cells: Vec<Cell<u32>> = Vec::new();
        assert_eq!(visible_range(&cells, Viewport::new(500, 300), 100), 0..0);
    }

    #[tokio::test]
    async fn window_includes_partially_visible_cells() {
        let m = loaded(vec![100; 10], 10, 250).await;
        // Window 150..400 touches cells 1 (100..200) through 3 (300..400)
        assert_eq!(visible_range(m.cells(), Viewport::new(150, 250), 0), 1..4);
    }

    #[tokio::test]
    async fn overscan_grows_window_both_ways() {
        let m = loaded(vec![100; 10], 10, 100).await;
        assert_eq!(visible_range(m.cells(), Viewport::new(500, 100), 0), 5..6);
        assert_eq!(visible_range(m.cells(), Viewport::new(500, 100), 150), 3..8);
    }

    #[tokio::test]
    async fn overscan_is_clamped_at_top() {
        let m = loaded(vec![100; 10], 10, 100).await;
        assert_eq!(visible_range(m.cells(), Viewport::new(0, 100), 1000), 0..10);
    }

    #[tokio::test]
    async fn scrolled_past_the_end_is_empty_at_tail() {
        let m = loaded(vec![100; 10], 10, 100).await;
        assert_eq!(visible_range(m.cells(), Viewport::new(5000, 100), 0), 10..10);
    }
}

// ===== Mount range =====

#[tokio::test]
async fn first_scroll_unmounts_appended_cells_out_of_view() {
    let mut m = loaded(vec![100; 50], 50, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 200);

    let outcome = scroller.on_scroll(&mut m);

    // Window 0..700
    assert_eq!(outcome.range, 0..7);
    assert_eq!(outcome.unmounted, (7..50).collect::<Vec<_>>());
    assert_eq!(mounted_indices(&m), (0..7).collect::<Vec<_>>());
    assert_attached_in_order(&m);
}

#[tokio::test]
async fn scrolling_keeps_mounted_set_equal_to_window() {
    let mut m = loaded(vec![100; 100], 100, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 200);
    scroller.on_scroll(&mut m);

    m.surface_mut().scroll_to(3000);
    let outcome = scroller.on_scroll(&mut m);

    assert_eq!(outcome.range, 28..37);
    assert_eq!(scroller.mounted_range(), 28..37);
    assert_eq!(mounted_indices(&m), (28..37).collect::<Vec<_>>());
    assert_attached_in_order(&m);
}

#[tokio::test]
async fn overlapping_scroll_only_touches_the_edges() {
    let mut m = loaded(vec![100; 100], 100, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    m.surface_mut().scroll_to(1000);
    scroller.on_scroll(&mut m);

    m.surface_mut().scroll_to(1200);
    let outcome = scroller.on_scroll(&mut m);

    assert_eq!(outcome.unmounted, vec![10, 11]);
    assert_eq!(outcome.mounted, vec![15, 16]);
}

#[tokio::test]
async fn scrolling_up_inserts_before_first_attached_node() {
    let mut m = loaded(vec![100; 100], 100, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    m.surface_mut().scroll_to(2000);
    scroller.on_scroll(&mut m);

    m.surface_mut().scroll_to(1700);
    let outcome = scroller.on_scroll(&mut m);

    assert_eq!(outcome.mounted, vec![17, 18, 19]);
    assert_attached_in_order(&m);
}

#[tokio::test]
async fn backward_scroll_remounts_without_rendering() {
    let mut m = loaded(vec![100; 40], 40, 1000).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    scroller.on_scroll(&mut m);
    assert_eq!(m.renderer().calls(), 40);
    let first_node = m.cells()[0].node();

    m.surface_mut().scroll_to(3000);
    scroller.on_scroll(&mut m);
    assert!((0..10).all(|i| !m.cells()[i].is_mounted()));

    m.surface_mut().scroll_to(0);
    let outcome = scroller.on_scroll(&mut m);

    assert_eq!(outcome.range, 0..10);
    assert_eq!(m.renderer().calls(), 40);
    assert_eq!(m.surface().nodes_created(), 40);
    assert_eq!(m.cells()[0].node(), first_node);
    assert_attached_in_order(&m);
}

#[tokio::test]
async fn height_change_keeps_window_consistent() {
    let mut m = loaded(vec![100; 30], 30, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    scroller.on_scroll(&mut m);

    let first = m.cells()[0].id();
    m.resize_cell(first, 400);
    let outcome = scroller.on_scroll(&mut m);

    // Cell 0 now covers 0..400, cell 1 starts at 400
    assert_eq!(outcome.range, 0..2);
    assert_eq!(mounted_indices(&m), vec![0, 1]);
}

// ===== Pagination =====

#[tokio::test]
async fn tail_triggers_single_fetch() {
    let mut m = loaded(vec![100; 20], 5, 1000).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    assert_eq!(m.source().fetch_calls(), 1);

    let first = scroller.on_scroll(&mut m);
    let second = scroller.on_scroll(&mut m);

    assert!(first.load.is_some());
    assert!(second.load.is_none(), "second trigger must be dropped");
    assert!(scroller.is_loading());
    assert_eq!(m.source().fetch_calls(), 2);
}

#[tokio::test]
async fn finished_load_appends_and_rearms() {
    let mut m = loaded(vec![100; 20], 5, 1000).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);

    let request = scroller.on_scroll(&mut m).load.unwrap();
    let result = request.future.await;
    let outcome = scroller.finish_load(&mut m, request.ticket, result).await;

    assert_eq!(outcome, Ok(PageOutcome::Appended(5)));
    assert!(!scroller.is_loading());
    assert_eq!(m.cells().len(), 10);

    // The new cells are mounted and the tail is in view again
    let next = scroller.on_scroll(&mut m);
    assert_eq!(next.range, 0..10);
    assert!(next.load.is_some());
}

#[tokio::test]
async fn failed_load_still_clears_guard() {
    let mut m = loaded(vec![100; 20], 5, 1000).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    m.source_mut().fail_next(FetchError::unavailable("offline"));

    let request = scroller.on_scroll(&mut m).load.unwrap();
    let result = request.future.await;
    let outcome = scroller.finish_load(&mut m, request.ticket, result).await;

    assert!(matches!(outcome, Err(TimelineError::Fetch(_))));
    assert!(!scroller.is_loading());
    assert!(scroller.on_scroll(&mut m).load.is_some(), "retry on next scroll");
}

#[tokio::test]
async fn exhausted_feed_stops_triggering() {
    let mut m = loaded(vec![100; 5], 5, 1000).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);

    let request = scroller.on_scroll(&mut m).load.unwrap();
    let result = request.future.await;
    let outcome = scroller.finish_load(&mut m, request.ticket, result).await;

    assert_eq!(outcome, Ok(PageOutcome::Exhausted));
    assert!(scroller.on_scroll(&mut m).load.is_none());
}

#[tokio::test]
async fn away_from_tail_does_not_fetch() {
    let mut m = loaded(vec![100; 50], 50, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);

    assert!(scroller.on_scroll(&mut m).load.is_none());
    assert_eq!(m.source().fetch_calls(), 1);
}

#[tokio::test]
async fn empty_timeline_is_a_no_op() {
    let mut m = loaded(Vec::new(), 5, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 100);

    let outcome = scroller.on_scroll(&mut m);

    assert_eq!(outcome.range, 0..0);
    assert!(outcome.is_idle());
}

// ===== Lifecycle =====

#[tokio::test]
async fn dispose_is_idempotent() {
    let mut m = loaded(vec![100; 10], 10, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    assert_eq!(m.surface().listener_count(), 1);

    scroller.dispose(&mut m);
    scroller.dispose(&mut m);

    assert!(scroller.is_disposed());
    assert_eq!(m.surface().listener_count(), 0);
    assert_eq!(m.surface().listener_removals(), 1);
    assert!(scroller.on_scroll(&mut m).is_idle());
}

#[tokio::test]
async fn paused_scroller_ignores_scrolls_until_resumed() {
    let mut m = loaded(vec![100; 50], 50, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    scroller.on_scroll(&mut m);

    scroller.pause();
    m.surface_mut().scroll_to(2000);
    assert!(scroller.on_scroll(&mut m).is_idle());
    assert_eq!(scroller.mounted_range(), 0..5);

    scroller.resume();
    assert_eq!(scroller.on_scroll(&mut m).range, 20..25);
}

#[tokio::test]
async fn reset_after_reinit_tracks_new_cells() {
    let mut m = loaded(vec![100; 50], 50, 500).await;
    let mut scroller = VirtualScroller::new(&mut m, 0);
    m.surface_mut().scroll_to(2000);
    scroller.on_scroll(&mut m);

    m.init_first_page().await.unwrap();
    scroller.reset();
    m.surface_mut().scroll_to(0);
    let outcome = scroller.on_scroll(&mut m);

    assert_eq!(outcome.range, 0..5);
    assert_eq!(mounted_indices(&m), (0..5).collect::<Vec<_>>());
    assert_attached_in_order(&m);
}
