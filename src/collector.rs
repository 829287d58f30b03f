use crate::logging::Logger;
use crate::models::Row;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

/// Scroll position sample for the table's scroll container (or the document
/// scrolling element when no dedicated container exists).
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct ScrollExtent {
    pub top: f64,
    pub height: f64,
    pub viewport: f64,
}

impl ScrollExtent {
    /// Whether the container sits within `slack` pixels of its maximum
    /// scroll position. Only meaningful after at least one scroll.
    pub fn at_end(&self, slack: f64) -> bool {
        self.top > 0.0 && (self.height - self.top - self.viewport) <= slack
    }
}

/// The slice of a live table the collector drives. The production
/// implementation wraps a browser tab; tests substitute scripted fakes.
pub trait TableView {
    /// Rows currently materialized in the document. Transient failures
    /// degrade to an empty batch.
    fn rows(&self) -> Vec<Row>;

    /// Scroll the container to its maximum extent, nudging lazy-load
    /// triggers. Best-effort.
    fn scroll_to_end(&self);

    /// Current scroll geometry, if it can be sampled.
    fn extent(&self) -> Option<ScrollExtent>;

    /// Whether the page shows an explicit all-loaded / none-remaining signal.
    fn completion_marker(&self) -> bool;
}

/// Tuning for the collection loop.
#[derive(Debug, Clone)]
pub struct CollectorParams {
    /// Hard ceiling on scroll iterations; the only unconditional stop.
    pub max_attempts: usize,
    /// Consecutive extraction rounds without a new row before stopping.
    pub empty_round_threshold: usize,
    /// Extract every k-th iteration to bound extraction cost.
    pub extract_every: usize,
    /// Run completion checks every m-th iteration (m > k).
    pub completion_check_every: usize,
    /// Empty rounds needed for the early exit shortcut.
    pub early_exit_rounds: usize,
    /// Attempts that must elapse before the early exit applies, so a slow
    /// first load is not mistaken for completion.
    pub min_attempts: usize,
    /// Pause after each scroll for lazy-load latency.
    pub scroll_delay: Duration,
    /// Distance from the maximum scroll position still counted as the end.
    pub end_slack: f64,
}

impl Default for CollectorParams {
    fn default() -> Self {
        Self {
            max_attempts: 500,
            empty_round_threshold: 5,
            extract_every: 3,
            completion_check_every: 15,
            early_exit_rounds: 2,
            min_attempts: 50,
            scroll_delay: Duration::from_millis(300),
            end_slack: 100.0,
        }
    }
}

/// Rows accumulated so far, keyed by content. Grows monotonically: a key
/// once seen is never re-emitted and nothing is ever removed.
#[derive(Debug, Default)]
pub struct CollectionState {
    rows: Vec<Row>,
    seen: HashSet<String>,
    pub scroll_attempts: usize,
    pub consecutive_empty_rounds: usize,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch, returning how many rows were new.
    pub fn merge(&mut self, batch: Vec<Row>) -> usize {
        let mut added = 0;
        for row in batch {
            if self.seen.insert(row.content_key()) {
                self.rows.push(row);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// Drives scroll-triggered lazy loading until the table stops yielding.
///
/// Completion is heuristic: the source never announces that all rows are
/// loaded, so the loop leans on the empty-round counter, the optional
/// completion text and the scroll extent, under a hard attempt ceiling. The
/// result is best-effort completeness, not a guarantee; callers needing
/// certainty must compare counts against whatever total the page shows.
pub struct Collector<'a> {
    params: CollectorParams,
    logger: &'a dyn Logger,
}

impl<'a> Collector<'a> {
    pub fn new(params: CollectorParams, logger: &'a dyn Logger) -> Self {
        Self { params, logger }
    }

    pub fn collect(&self, view: &dyn TableView) -> Vec<Row> {
        let p = &self.params;
        let mut state = CollectionState::new();

        let added = state.merge(view.rows());
        self.logger
            .info("collect", &format!("initial extraction: {added} rows"));

        while state.scroll_attempts < p.max_attempts
            && state.consecutive_empty_rounds < p.empty_round_threshold
        {
            view.scroll_to_end();
            if !p.scroll_delay.is_zero() {
                thread::sleep(p.scroll_delay);
            }

            if state.scroll_attempts % p.extract_every == 0 {
                let added = state.merge(view.rows());
                if added > 0 {
                    state.consecutive_empty_rounds = 0;
                    self.logger.info(
                        "collect",
                        &format!(
                            "rows: {}, new: {added}, attempt: {}",
                            state.len(),
                            state.scroll_attempts
                        ),
                    );
                } else {
                    state.consecutive_empty_rounds += 1;
                }
            }

            state.scroll_attempts += 1;

            if state.scroll_attempts % p.completion_check_every == 0 {
                if view.completion_marker() {
                    self.logger
                        .info("collect", "completion signal reported by the page");
                    state.consecutive_empty_rounds = p.empty_round_threshold;
                } else if let Some(extent) = view.extent() {
                    if extent.at_end(p.end_slack) {
                        self.logger.debug("collect", "scroll container reached its end");
                        state.consecutive_empty_rounds += 1;
                    }
                }
            }

            if state.consecutive_empty_rounds >= p.early_exit_rounds
                && state.scroll_attempts > p.min_attempts
            {
                self.logger
                    .info("collect", "repeated empty rounds, assuming collection complete");
                break;
            }
        }

        // Trailing rows can slip past the periodic checks; one forced pass.
        view.scroll_to_end();
        if !p.scroll_delay.is_zero() {
            thread::sleep(p.scroll_delay);
        }
        let added = state.merge(view.rows());
        if added > 0 {
            self.logger
                .info("collect", &format!("final pass found {added} additional rows"));
        }

        self.logger.info(
            "collect",
            &format!(
                "collection complete: {} unique rows after {} scroll attempts",
                state.len(),
                state.scroll_attempts
            ),
        );
        state.into_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::test_support::MemoryLogger;
    use std::cell::{Cell, RefCell};

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(c, v)| (c.to_string(), v.to_string()))
            .collect()
    }

    /// Scripted table: serves batches per extraction call (last batch
    /// repeats), counts scrolls, optionally reports completion or an extent.
    struct FakeTable {
        batches: RefCell<Vec<Vec<Row>>>,
        last: RefCell<Vec<Row>>,
        scrolls: Cell<usize>,
        extent: Option<ScrollExtent>,
        completion_after_scrolls: Option<usize>,
    }

    impl FakeTable {
        fn with_batches(batches: Vec<Vec<Row>>) -> Self {
            Self {
                batches: RefCell::new(batches),
                last: RefCell::new(Vec::new()),
                scrolls: Cell::new(0),
                extent: None,
                completion_after_scrolls: None,
            }
        }
    }

    impl TableView for FakeTable {
        fn rows(&self) -> Vec<Row> {
            let mut batches = self.batches.borrow_mut();
            if batches.is_empty() {
                self.last.borrow().clone()
            } else {
                let batch = batches.remove(0);
                *self.last.borrow_mut() = batch.clone();
                batch
            }
        }

        fn scroll_to_end(&self) {
            self.scrolls.set(self.scrolls.get() + 1);
        }

        fn extent(&self) -> Option<ScrollExtent> {
            self.extent
        }

        fn completion_marker(&self) -> bool {
            self.completion_after_scrolls
                .map(|n| self.scrolls.get() >= n)
                .unwrap_or(false)
        }
    }

    fn fast_params() -> CollectorParams {
        CollectorParams {
            scroll_delay: Duration::ZERO,
            ..CollectorParams::default()
        }
    }

    #[test]
    fn static_table_collects_once_and_terminates() {
        // No scrolling needed: the same two rows on every pass.
        let table = FakeTable::with_batches(vec![vec![
            row(&[("Name", "Widget"), ("Price", "9.99")]),
            row(&[("Name", "Gadget"), ("Price", "14.50")]),
        ]]);
        let logger = MemoryLogger::default();
        let rows = Collector::new(fast_params(), &logger).collect(&table);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some("Widget"));
        assert_eq!(rows[1].get("Price"), Some("14.50"));
        // Empty-round threshold alone stopped the loop, well under the
        // attempt ceiling.
        assert!(table.scrolls.get() < 30);
    }

    #[test]
    fn overlapping_batches_deduplicate_in_discovery_order() {
        let table = FakeTable::with_batches(vec![
            vec![row(&[("Name", "A")]), row(&[("Name", "B")])],
            vec![row(&[("Name", "B")]), row(&[("Name", "C")])],
            vec![row(&[("Name", "C")])],
        ]);
        let logger = MemoryLogger::default();
        let rows = Collector::new(fast_params(), &logger).collect(&table);

        let names: Vec<&str> = rows.iter().filter_map(|r| r.get("Name")).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut state = CollectionState::new();
        let r = row(&[("Name", "Widget"), ("Price", "9.99")]);
        assert_eq!(state.merge(vec![r.clone()]), 1);
        assert_eq!(state.merge(vec![r.clone()]), 0);
        assert_eq!(state.len(), 1);

        // Same content, different column order: still one row.
        let reordered = row(&[("Price", "9.99"), ("Name", "Widget")]);
        assert_eq!(state.merge(vec![reordered]), 0);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn collected_size_never_decreases() {
        let mut state = CollectionState::new();
        let batches = vec![
            vec![row(&[("Name", "A")])],
            vec![],
            vec![row(&[("Name", "A")]), row(&[("Name", "B")])],
            vec![row(&[("Name", "B")])],
        ];
        let mut previous = 0;
        for batch in batches {
            state.merge(batch);
            assert!(state.len() >= previous);
            previous = state.len();
        }
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn attempt_ceiling_stops_an_endlessly_growing_source() {
        // Every extraction yields a fresh row, so empty rounds never
        // accumulate; only the ceiling can stop the loop.
        struct EndlessTable {
            counter: Cell<usize>,
            scrolls: Cell<usize>,
        }
        impl TableView for EndlessTable {
            fn rows(&self) -> Vec<Row> {
                let n = self.counter.get() + 1;
                self.counter.set(n);
                let name = format!("item-{n}");
                vec![row(&[("Name", name.as_str())])]
            }
            fn scroll_to_end(&self) {
                self.scrolls.set(self.scrolls.get() + 1);
            }
            fn extent(&self) -> Option<ScrollExtent> {
                None
            }
            fn completion_marker(&self) -> bool {
                false
            }
        }

        let table = EndlessTable {
            counter: Cell::new(0),
            scrolls: Cell::new(0),
        };
        let params = CollectorParams {
            max_attempts: 30,
            ..fast_params()
        };
        let logger = MemoryLogger::default();
        let rows = Collector::new(params, &logger).collect(&table);

        // 30 loop scrolls plus the final forced pass.
        assert_eq!(table.scrolls.get(), 31);
        assert!(!rows.is_empty());
    }

    #[test]
    fn completion_marker_forces_early_exit() {
        struct GrowingTable {
            counter: Cell<usize>,
            scrolls: Cell<usize>,
        }
        impl TableView for GrowingTable {
            fn rows(&self) -> Vec<Row> {
                let n = self.counter.get() + 1;
                self.counter.set(n);
                let name = format!("item-{n}");
                vec![row(&[("Name", name.as_str())])]
            }
            fn scroll_to_end(&self) {
                self.scrolls.set(self.scrolls.get() + 1);
            }
            fn extent(&self) -> Option<ScrollExtent> {
                None
            }
            fn completion_marker(&self) -> bool {
                self.scrolls.get() >= 15
            }
        }

        let table = GrowingTable {
            counter: Cell::new(0),
            scrolls: Cell::new(0),
        };
        let logger = MemoryLogger::default();
        Collector::new(fast_params(), &logger).collect(&table);

        // The marker lands on the first completion check (attempt 15) and
        // drives the empty counter to the threshold; the growing rows would
        // otherwise have kept the loop running to the ceiling.
        assert!(table.scrolls.get() <= 17);
    }

    #[test]
    fn stalled_scroll_extent_accumulates_empty_rounds() {
        let mut table = FakeTable::with_batches(vec![vec![row(&[("Name", "only")])]]);
        table.extent = Some(ScrollExtent {
            top: 900.0,
            height: 1300.0,
            viewport: 400.0,
        });
        let params = CollectorParams {
            // After the duplicate extraction at attempt 0, only the extent
            // checks can accumulate further empty rounds.
            extract_every: 10_000,
            completion_check_every: 2,
            empty_round_threshold: 3,
            ..fast_params()
        };
        let logger = MemoryLogger::default();
        let rows = Collector::new(params, &logger).collect(&table);

        assert_eq!(rows.len(), 1);
        // One empty extraction round plus extent checks at attempts 2 and 4
        // reach the threshold; four loop scrolls and the final forced pass.
        assert_eq!(table.scrolls.get(), 5);
    }

    #[test]
    fn extent_at_end_requires_a_prior_scroll() {
        let fresh = ScrollExtent {
            top: 0.0,
            height: 2000.0,
            viewport: 400.0,
        };
        assert!(!fresh.at_end(100.0));

        let bottom = ScrollExtent {
            top: 1550.0,
            height: 2000.0,
            viewport: 400.0,
        };
        assert!(bottom.at_end(100.0));

        let midway = ScrollExtent {
            top: 500.0,
            height: 2000.0,
            viewport: 400.0,
        };
        assert!(!midway.at_end(100.0));
    }
}
