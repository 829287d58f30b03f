use crate::browser::BrowserError;
use crate::extract;
use crate::locator::{LocatorSpec, Query, Resolver};
use crate::logging::Logger;
use crate::wait::{poll_until, Deadline};
use headless_chrome::Tab;
use std::thread;
use std::time::Duration;

/// One click along the fixed path to the product table.
pub struct NavigationStep {
    pub name: &'static str,
    pub locator: LocatorSpec,
    /// Fixed delay after the click; the destination UI renders asynchronously
    /// and exposes no ready event.
    pub settle: Duration,
    /// Optional steps may fail resolution without failing the flow.
    pub optional: bool,
    /// Skip the step entirely when this marker already resolves, e.g. a menu
    /// that is already open.
    pub skip_when_visible: Option<LocatorSpec>,
}

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("navigation step '{0}' failed: target never became visible")]
    StepFailed(&'static str),

    #[error("product table never appeared or stayed empty")]
    TableEmpty,

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

fn menu_markers() -> LocatorSpec {
    LocatorSpec::new(vec![
        Query::Role {
            role: "menuitem",
            text: "",
        },
        Query::Text {
            tag: "a",
            text: "Data Tools",
        },
        Query::Text {
            tag: "li",
            text: "Data Tools",
        },
        Query::Text {
            tag: "button",
            text: "Data Tools",
        },
    ])
}

fn named_entry(text: &'static str, testid: &'static str) -> LocatorSpec {
    LocatorSpec::new(vec![
        Query::Text { tag: "a", text },
        Query::Text { tag: "button", text },
        Query::Text { tag: "h2", text },
        Query::Text { tag: "h3", text },
        Query::TestId(testid),
    ])
}

/// The fixed menu traversal: entry button, menu, two levels of sections, the
/// leaf action that triggers the data load.
pub fn catalog_path() -> Vec<NavigationStep> {
    vec![
        NavigationStep {
            name: "launch challenge",
            locator: LocatorSpec::new(vec![
                Query::Text {
                    tag: "button",
                    text: "Launch Challenge",
                },
                Query::Text {
                    tag: "a",
                    text: "Launch Challenge",
                },
                Query::TestId("launch-challenge"),
            ]),
            settle: Duration::from_secs(2),
            optional: true,
            skip_when_visible: None,
        },
        NavigationStep {
            name: "open menu",
            locator: LocatorSpec::new(vec![
                Query::Text {
                    tag: "button",
                    text: "Menu",
                },
                Query::Css("button[aria-label*='menu' i]"),
                Query::TestId("menu"),
                Query::Css("[class*='menu'] button"),
                Query::Css("button:has(svg)"),
            ]),
            settle: Duration::from_secs(1),
            optional: true,
            skip_when_visible: Some(menu_markers()),
        },
        NavigationStep {
            name: "data tools",
            locator: LocatorSpec::new(vec![
                Query::Text {
                    tag: "a",
                    text: "Data Tools",
                },
                Query::Text {
                    tag: "button",
                    text: "Data Tools",
                },
                Query::Text {
                    tag: "li",
                    text: "Data Tools",
                },
                Query::Role {
                    role: "menuitem",
                    text: "Data Tools",
                },
            ]),
            settle: Duration::from_secs(2),
            optional: false,
            skip_when_visible: None,
        },
        NavigationStep {
            name: "inventory management",
            locator: named_entry("Inventory Management", "inventory-management"),
            settle: Duration::from_secs(2),
            optional: false,
            skip_when_visible: None,
        },
        NavigationStep {
            name: "product catalog",
            locator: named_entry("Product Catalog", "product-catalog"),
            settle: Duration::from_secs(2),
            optional: false,
            skip_when_visible: None,
        },
        NavigationStep {
            name: "load product data",
            locator: LocatorSpec::new(vec![
                Query::Text {
                    tag: "button",
                    text: "Load Product Data",
                },
                Query::Text {
                    tag: "button",
                    text: "Load Data",
                },
                Query::Text {
                    tag: "button",
                    text: "Load Products",
                },
                Query::TestId("load-data"),
                Query::TestId("load-products"),
            ]),
            settle: Duration::from_secs(3),
            optional: false,
            skip_when_visible: None,
        },
    ]
}

/// Walks a fixed step list. A required step that fails resolution fails the
/// whole flow immediately, naming the step; that name is the first thing
/// worth reading when the application markup drifts.
pub struct Navigator<'t> {
    tab: &'t Tab,
    logger: &'t dyn Logger,
    step_timeout: Duration,
    table_timeout: Duration,
}

impl<'t> Navigator<'t> {
    pub fn new(tab: &'t Tab, logger: &'t dyn Logger) -> Self {
        Self {
            tab,
            logger,
            step_timeout: Duration::from_secs(5),
            table_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeouts(mut self, step: Duration, table: Duration) -> Self {
        self.step_timeout = step;
        self.table_timeout = table;
        self
    }

    pub fn run(&self, steps: &[NavigationStep]) -> Result<(), NavigationError> {
        let resolver = Resolver::new(self.tab, self.logger);
        let skip_probe = Duration::from_secs(2);

        for step in steps {
            if let Some(marker) = &step.skip_when_visible {
                if resolver.resolve(marker, skip_probe).is_some() {
                    self.logger
                        .info("nav", &format!("skipping '{}', already satisfied", step.name));
                    continue;
                }
            }

            match resolver.resolve(&step.locator, self.step_timeout) {
                Some(element) => {
                    element
                        .click()
                        .map_err(|e| BrowserError::Interaction(e.to_string()))?;
                    self.logger.info("nav", &format!("clicked '{}'", step.name));
                    thread::sleep(step.settle);
                }
                None if step.optional => {
                    self.logger
                        .debug("nav", &format!("optional step '{}' not present", step.name));
                }
                None => {
                    self.logger
                        .error("nav", &format!("step '{}' failed to resolve", step.name));
                    return Err(NavigationError::StepFailed(step.name));
                }
            }
        }

        self.wait_for_table()
    }

    /// The path only counts as traversed once a table exists and holds at
    /// least one body row.
    fn wait_for_table(&self) -> Result<(), NavigationError> {
        let deadline = Deadline::from_now(self.table_timeout);

        let populated = poll_until(deadline, Duration::from_millis(500), || {
            let html = self.tab.get_content().ok()?;
            let rows = extract::rows_from_html(&html);
            (!rows.is_empty()).then_some(())
        });

        match populated {
            Some(()) => {
                self.logger.info("nav", "product table loaded with data");
                Ok(())
            }
            None => Err(NavigationError::TableEmpty),
        }
    }
}
