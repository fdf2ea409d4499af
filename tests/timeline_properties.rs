//! Property-based tests for layout and windowing invariants.
//!
//! Properties under test:
//! - Offset contiguity: cells stay back to back after appends and resizes
//! - Mount-range correctness: after every scroll the mounted cells are
//!   exactly the computed window, attached in cell order

use proptest::prelude::*;
use vtimeline::source::MemoryFeed;
use vtimeline::timeline::headless::{HeadlessContent, HeadlessRenderer, HeadlessSurface};
use vtimeline::timeline::{
    visible_range, SettlePolicy, Surface, TimelineManager, TimelineOptions, VirtualScroller,
};

type Fixed = fn(&u32) -> HeadlessContent;
type TestManager = TimelineManager<HeadlessSurface, HeadlessRenderer<Fixed>, MemoryFeed<u32>>;

fn fixed(height: &u32) -> HeadlessContent {
    HeadlessContent::fixed(*height)
}

fn block_on<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn loaded(heights: Vec<u32>, first_page: usize, viewport: u32) -> TestManager {
    let mut m = TimelineManager::new(
        HeadlessSurface::new(viewport),
        HeadlessRenderer::new(fixed as Fixed),
        MemoryFeed::new(heights),
        TimelineOptions {
            first_page_size: first_page,
            page_size: 7,
            settle: SettlePolicy::immediate(),
            ..TimelineOptions::default()
        },
    )
    .expect("valid options");
    block_on(m.init_first_page()).expect("memory feed never fails");
    m
}

fn check_contiguity(m: &TestManager) -> Result<(), TestCaseError> {
    let cells = m.cells();
    prop_assert!(cells.first().map_or(true, |c| c.offset() == 0));
    for pair in cells.windows(2) {
        prop_assert_eq!(pair[0].offset() + pair[0].height(), pair[1].offset());
    }
    prop_assert_eq!(m.list_height(), cells.last().map_or(0, |c| c.bottom()));
    Ok(())
}

// ===== Arbitrary Strategies =====

fn arb_heights() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..400, 1..60)
}

/// (cell index seed, new height) pairs
fn arb_resizes() -> impl Strategy<Value = Vec<(usize, u32)>> {
    prop::collection::vec((any::<usize>(), 0u32..600), 0..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn appends_keep_cells_contiguous(heights in arb_heights(), first_page in 1usize..20) {
        let mut m = loaded(heights.clone(), first_page, 500);
        check_contiguity(&m)?;

        while !m.is_exhausted() {
            block_on(m.load_more_data()).expect("memory feed never fails");
            check_contiguity(&m)?;
        }
        prop_assert_eq!(m.cells().len(), heights.len());
        prop_assert_eq!(m.list_height(), heights.iter().sum::<u32>());
    }

    #[test]
    fn resizes_keep_cells_contiguous(heights in arb_heights(), resizes in arb_resizes()) {
        let count = heights.len();
        let mut m = loaded(heights, count, 500);

        for (seed, height) in resizes {
            let id = m.cells()[seed % count].id();
            let before = m.list_height();
            let delta = m.resize_cell(id, height).unwrap_or(0);
            check_contiguity(&m)?;
            prop_assert_eq!(i64::from(m.list_height()), i64::from(before) + delta);
        }
    }

    #[test]
    fn mounted_cells_match_window(
        heights in arb_heights(),
        viewport in 1u32..800,
        overscan in 0u32..400,
        scrolls in prop::collection::vec(0u32..20_000, 1..15),
    ) {
        let count = heights.len();
        let mut m = loaded(heights, count, viewport);
        let mut scroller = VirtualScroller::new(&mut m, overscan);

        for scroll_top in scrolls {
            m.surface_mut().scroll_to(scroll_top);
            let outcome = scroller.on_scroll(&mut m);

            let expected = visible_range(m.cells(), m.surface().viewport(), overscan);
            prop_assert_eq!(outcome.range.clone(), expected.clone());
            prop_assert_eq!(scroller.mounted_range(), expected.clone());

            let mounted: Vec<usize> = m
                .cells()
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_mounted())
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(mounted, expected.collect::<Vec<_>>());

            let attached: Vec<_> = m
                .cells()
                .iter()
                .filter(|c| c.is_mounted())
                .filter_map(|c| c.node())
                .collect();
            prop_assert_eq!(m.surface().attached(), attached.as_slice());
        }
    }
}
