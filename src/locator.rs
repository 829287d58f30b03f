use crate::logging::Logger;
use crate::wait::{poll_until, Deadline};
use headless_chrome::{Element, Tab};
use std::fmt;
use std::time::Duration;

/// One way to query a logical UI element.
///
/// Plain data, no behavior: the resolver turns each variant into a CSS or
/// XPath lookup. Markup drifts between builds, so every target carries
/// several of these and the first visible hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Raw CSS selector, passed through untouched.
    Css(&'static str),
    /// Element of `tag` whose normalized text contains `text`.
    Text {
        tag: &'static str,
        text: &'static str,
    },
    /// Element with the given ARIA role whose text contains `text`.
    Role {
        role: &'static str,
        text: &'static str,
    },
    /// `data-testid` attribute containing the given value.
    TestId(&'static str),
}

/// Concrete lookup expression a `Query` lowers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Css(String),
    XPath(String),
}

impl Query {
    pub fn to_lookup(self) -> Lookup {
        match self {
            Query::Css(selector) => Lookup::Css(selector.to_string()),
            Query::Text { tag, text } => Lookup::XPath(format!(
                "//{tag}[contains(normalize-space(.), '{text}')]"
            )),
            Query::Role { role, text } => Lookup::XPath(format!(
                "//*[@role='{role}'][contains(normalize-space(.), '{text}')]"
            )),
            Query::TestId(value) => Lookup::Css(format!("[data-testid*='{value}']")),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Css(selector) => write!(f, "css:{selector}"),
            Query::Text { tag, text } => write!(f, "text:{tag}:{text}"),
            Query::Role { role, text } => write!(f, "role:{role}:{text}"),
            Query::TestId(value) => write!(f, "testid:{value}"),
        }
    }
}

/// Ordered candidate queries for one logical UI element. Earlier candidates
/// take priority; order is preserved exactly as declared.
#[derive(Debug, Clone)]
pub struct LocatorSpec {
    candidates: Vec<Query>,
}

impl LocatorSpec {
    pub fn new(candidates: Vec<Query>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Query] {
        &self.candidates
    }
}

impl From<Vec<Query>> for LocatorSpec {
    fn from(candidates: Vec<Query>) -> Self {
        Self::new(candidates)
    }
}

/// Visibility check run against the bound element inside the page.
const VISIBLE_JS: &str = r#"
function() {
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden') {
        return false;
    }
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}
"#;

/// Finds the first visible element matching a `LocatorSpec`.
///
/// Candidates are tried in declared order, each with a short budget bounded
/// by the overall deadline. Not-found is a value, not an error: `resolve`
/// returns `None` and the caller decides whether that is fatal. Transport
/// failures surface from whatever interaction the caller performs on the
/// returned element.
pub struct Resolver<'t> {
    tab: &'t Tab,
    logger: &'t dyn Logger,
    candidate_budget: Duration,
    poll_interval: Duration,
}

impl<'t> Resolver<'t> {
    pub fn new(tab: &'t Tab, logger: &'t dyn Logger) -> Self {
        Self {
            tab,
            logger,
            candidate_budget: Duration::from_secs(3),
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn with_candidate_budget(mut self, budget: Duration) -> Self {
        self.candidate_budget = budget;
        self
    }

    pub fn resolve(&self, spec: &LocatorSpec, timeout: Duration) -> Option<Element<'t>> {
        let overall = Deadline::from_now(timeout);

        for query in spec.candidates() {
            if overall.expired() {
                break;
            }
            let budget = overall.bounded(self.candidate_budget);
            let lookup = query.to_lookup();

            let hit = poll_until(budget, self.poll_interval, || self.probe(&lookup));
            if let Some(element) = hit {
                self.logger
                    .debug("resolve", &format!("bound element via {query}"));
                return Some(element);
            }
        }

        None
    }

    fn probe(&self, lookup: &Lookup) -> Option<Element<'t>> {
        let element = match lookup {
            Lookup::Css(selector) => self.tab.find_element(selector).ok()?,
            Lookup::XPath(xpath) => self.tab.find_element_by_xpath(xpath).ok()?,
        };
        self.is_visible(&element).then_some(element)
    }

    fn is_visible(&self, element: &Element<'t>) -> bool {
        element
            .call_js_fn(VISIBLE_JS, vec![], false)
            .ok()
            .and_then(|r| r.value)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}
