/// End-to-end collection over simulated virtualized table snapshots.
/// Exercises the extractor and the collector together without a browser.
use catalog_scraper::collector::{Collector, CollectorParams, ScrollExtent, TableView};
use catalog_scraper::extract::rows_from_html;
use catalog_scraper::logging::NullLogger;
use catalog_scraper::models::Row;
use std::cell::{Cell, RefCell};
use std::time::Duration;

/// Serves successive page snapshots the way a virtualized table would: each
/// window shows a slice of rows overlapping the previous one.
struct SnapshotTable {
    snapshots: RefCell<Vec<String>>,
    current: RefCell<String>,
    scrolls: Cell<usize>,
}

impl SnapshotTable {
    fn new(snapshots: Vec<String>) -> Self {
        Self {
            snapshots: RefCell::new(snapshots),
            current: RefCell::new(String::new()),
            scrolls: Cell::new(0),
        }
    }
}

impl TableView for SnapshotTable {
    fn rows(&self) -> Vec<Row> {
        let mut snapshots = self.snapshots.borrow_mut();
        if !snapshots.is_empty() {
            *self.current.borrow_mut() = snapshots.remove(0);
        }
        rows_from_html(&self.current.borrow())
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

fn table_html(rows: &[(u32, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(id, name)| format!("<tr><td>{id}</td><td>{name}</td></tr>"))
        .collect();
    format!(
        "<table><thead><tr><th>ID</th><th>Name</th></tr></thead><tbody>{body}</tbody></table>"
    )
}

fn fast_params() -> CollectorParams {
    CollectorParams {
        scroll_delay: Duration::ZERO,
        ..CollectorParams::default()
    }
}

#[test]
fn collects_across_overlapping_windows_without_duplicates() {
    let table = SnapshotTable::new(vec![
        table_html(&[(1, "Widget"), (2, "Gadget"), (3, "Sprocket")]),
        table_html(&[(2, "Gadget"), (3, "Sprocket"), (4, "Gizmo")]),
        table_html(&[(4, "Gizmo"), (5, "Doohickey")]),
        table_html(&[(4, "Gizmo"), (5, "Doohickey")]),
    ]);

    let logger = NullLogger;
    let rows = Collector::new(fast_params(), &logger).collect(&table);

    let ids: Vec<&str> = rows.iter().filter_map(|r| r.get("ID")).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn static_two_row_table_terminates_with_exact_rows() {
    // Header ["Name", "Price"], two body rows, nothing to scroll: the
    // collector must yield exactly those rows and stop on empty rounds.
    let html = "<table>\
        <thead><tr><th>Name</th><th>Price</th></tr></thead>\
        <tbody>\
            <tr><td>Widget</td><td>9.99</td></tr>\
            <tr><td>Gadget</td><td>14.50</td></tr>\
        </tbody></table>";
    let table = SnapshotTable::new(vec![html.to_string()]);

    let logger = NullLogger;
    let rows = Collector::new(fast_params(), &logger).collect(&table);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Name"), Some("Widget"));
    assert_eq!(rows[0].get("Price"), Some("9.99"));
    assert_eq!(rows[1].get("Name"), Some("Gadget"));
    assert_eq!(rows[1].get("Price"), Some("14.50"));
    assert!(table.scrolls.get() < CollectorParams::default().max_attempts);
}

#[test]
fn empty_page_yields_empty_export() {
    let table = SnapshotTable::new(vec!["<div>no table yet</div>".to_string()]);
    let logger = NullLogger;
    let rows = Collector::new(fast_params(), &logger).collect(&table);
    assert!(rows.is_empty());
}

#[test]
fn export_roundtrip_preserves_row_order() {
    let table = SnapshotTable::new(vec![table_html(&[(1, "Widget"), (2, "Gadget")])]);
    let logger = NullLogger;
    let rows = Collector::new(fast_params(), &logger).collect(&table);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.json");
    catalog_scraper::export::write_rows(&path, &rows).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["ID"], "1");
    assert_eq!(parsed[1]["Name"], "Gadget");
}
