use crate::collector::{ScrollExtent, TableView};
use crate::extract;
use crate::logging::Logger;
use crate::models::Row;
use crate::wait::{poll_until, Deadline};
use headless_chrome::Tab;
use std::time::Duration;

/// Targets the application's scroll container first, then the document
/// scrolling element when none exists.
const SCROLL_JS: &str = r#"
    (() => {
        const el = document.querySelector('.infinite-table')
            || document.scrollingElement
            || document.documentElement;
        el.scrollTop = el.scrollHeight;
        el.scrollTop = el.scrollTop + 16;
        return el.scrollTop;
    })()
"#;

const EXTENT_JS: &str = r#"
    (() => {
        const el = document.querySelector('.infinite-table')
            || document.scrollingElement
            || document.documentElement;
        return JSON.stringify({
            top: el.scrollTop,
            height: el.scrollHeight,
            viewport: el.clientHeight
        });
    })()
"#;

const STATUS_TEXT_JS: &str = r#"
    (() => {
        const nodes = document.querySelectorAll(
            'div.text-center span, div.text-muted-foreground'
        );
        const out = [];
        for (const n of nodes) {
            const t = (n.innerText || '').trim();
            if (t) out.push(t);
        }
        return out.join('\n');
    })()
"#;

/// Whether status text announces that nothing remains to load.
pub fn completion_signal(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("0 remaining") || text.contains("all products loaded")
}

/// The live product table on a browser tab.
///
/// Every operation degrades instead of failing: a hiccup during one scroll
/// iteration costs an empty round, never the whole collection.
pub struct CatalogTable<'t> {
    tab: &'t Tab,
    logger: &'t dyn Logger,
    discovery_timeout: Duration,
}

impl<'t> CatalogTable<'t> {
    pub fn new(tab: &'t Tab, logger: &'t dyn Logger) -> Self {
        Self {
            tab,
            logger,
            discovery_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    fn table_present(&self) -> bool {
        let deadline = Deadline::from_now(self.discovery_timeout);
        poll_until(deadline, Duration::from_millis(200), || {
            let present = self
                .tab
                .evaluate(
                    r#"!!document.querySelector("table, [role='table']")"#,
                    false,
                )
                .ok()
                .and_then(|r| r.value)
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            present.then_some(())
        })
        .is_some()
    }

    fn evaluate_string(&self, script: &str) -> Option<String> {
        self.tab
            .evaluate(script, false)
            .ok()
            .and_then(|r| r.value)
            .and_then(|v| v.as_str().map(|s| s.to_string()))
    }
}

impl TableView for CatalogTable<'_> {
    fn rows(&self) -> Vec<Row> {
        if !self.table_present() {
            self.logger.debug("collect", "no table present on the page");
            return Vec::new();
        }
        match self.tab.get_content() {
            Ok(html) => extract::rows_from_html(&html),
            Err(e) => {
                self.logger
                    .warn("collect", &format!("failed to snapshot page content: {e}"));
                Vec::new()
            }
        }
    }

    fn scroll_to_end(&self) {
        if let Err(e) = self.tab.evaluate(SCROLL_JS, false) {
            self.logger.debug("collect", &format!("scroll failed: {e}"));
        }
    }

    fn extent(&self) -> Option<ScrollExtent> {
        let raw = self.evaluate_string(EXTENT_JS)?;
        serde_json::from_str(&raw).ok()
    }

    fn completion_marker(&self) -> bool {
        self.evaluate_string(STATUS_TEXT_JS)
            .map(|text| completion_signal(&text))
            .unwrap_or(false)
    }
}
