use crate::browser::capture_diagnostic;
use crate::locator::{LocatorSpec, Query, Resolver};
use crate::logging::Logger;
use crate::page;
use crate::wait::{poll_until, Deadline};
use headless_chrome::Tab;
use std::fmt;
use std::time::Duration;

/// Classified result of a sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    Failed,
    TimedOut,
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginOutcome::Success => write!(f, "success"),
            LoginOutcome::Failed => write!(f, "failed"),
            LoginOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Markers that only render once the user is signed in. Seeing any of them
/// short-circuits the whole login flow.
pub const POST_LOGIN_MARKERS: [&str; 4] = [
    "Product Dashboard",
    "Assessment ID:",
    "Layout: Table",
    "Open the menu to access system features",
];

fn email_field() -> LocatorSpec {
    LocatorSpec::new(vec![
        Query::Css("input[type='email']"),
        Query::Css("input[name='email']"),
        Query::Css("input[id*='email']"),
        Query::Css("input[type='text'][placeholder*='email' i]"),
    ])
}

fn password_field() -> LocatorSpec {
    LocatorSpec::new(vec![
        Query::Css("input[type='password']"),
        Query::Css("input[name='password']"),
        Query::Css("input[id*='password']"),
        Query::Css("input[placeholder*='password' i]"),
    ])
}

fn submit_control() -> LocatorSpec {
    LocatorSpec::new(vec![
        Query::Css("button[type='submit']"),
        Query::Css("input[type='submit']"),
        Query::Text {
            tag: "button",
            text: "Sign in",
        },
        Query::Text {
            tag: "button",
            text: "Sign In",
        },
        Query::Text {
            tag: "button",
            text: "Login",
        },
        Query::Text {
            tag: "button",
            text: "Log in",
        },
    ])
}

/// Whether the browser has left the login page for somewhere that is not
/// itself a login path. Trailing slashes are ignored.
pub(crate) fn url_left_login(current: &str, login_url: &str) -> bool {
    let current = current.trim_end_matches('/');
    let login = login_url.trim_end_matches('/');
    current != login && !current.ends_with("/login")
}

/// Whether alert text reads like a rejected login.
pub(crate) fn is_error_text(text: &str) -> bool {
    regex::Regex::new(r"(?i)invalid|incorrect|error")
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Signal classification for one polling iteration, in priority order: a URL
/// change wins over a success marker, which wins over an error marker.
pub(crate) fn classify(
    url_moved: bool,
    success_marker: bool,
    error_marker: bool,
) -> Option<LoginOutcome> {
    if url_moved || success_marker {
        Some(LoginOutcome::Success)
    } else if error_marker {
        Some(LoginOutcome::Failed)
    } else {
        None
    }
}

/// Drives the login form and classifies the outcome.
///
/// Single attempt per run: `Failed` and `TimedOut` are hard stops for the
/// caller, diagnosed with a screenshot, never retried here.
pub struct LoginFlow<'t> {
    tab: &'t Tab,
    logger: &'t dyn Logger,
    login_url: String,
    timeout: Duration,
}

impl<'t> LoginFlow<'t> {
    pub fn new(tab: &'t Tab, logger: &'t dyn Logger, login_url: String, timeout: Duration) -> Self {
        Self {
            tab,
            logger,
            login_url,
            timeout,
        }
    }

    /// Prior-session check: post-login markers visible without touching the
    /// form means the persisted session is still good.
    pub fn already_authenticated(&self) -> bool {
        POST_LOGIN_MARKERS
            .iter()
            .any(|marker| page::text_visible(self.tab, marker))
    }

    /// Fill the form, submit it and wait for a classified outcome.
    pub fn sign_in(&self, credentials: &Credentials) -> LoginOutcome {
        let resolver = Resolver::new(self.tab, self.logger);

        let Some(email) = resolver.resolve(&email_field(), Duration::from_secs(10)) else {
            self.logger
                .error("login", "could not find email input on login page");
            capture_diagnostic(self.tab, "login_form_missing.png", self.logger);
            return LoginOutcome::Failed;
        };
        if let Err(e) = email.click().and_then(|el| el.type_into(&credentials.email)) {
            self.logger
                .error("login", &format!("failed to fill email field: {e}"));
            return LoginOutcome::Failed;
        }
        self.logger.info("login", "filled email field");

        let Some(password) = resolver.resolve(&password_field(), Duration::from_secs(5)) else {
            self.logger
                .error("login", "could not find password input on login page");
            capture_diagnostic(self.tab, "password_missing.png", self.logger);
            return LoginOutcome::Failed;
        };
        if let Err(e) = password
            .click()
            .and_then(|el| el.type_into(&credentials.password))
        {
            self.logger
                .error("login", &format!("failed to fill password field: {e}"));
            return LoginOutcome::Failed;
        }
        self.logger.info("login", "filled password field");

        // The Enter fallback is mandatory when no submit control resolves.
        match resolver.resolve(&submit_control(), Duration::from_secs(5)) {
            Some(submit) => {
                if let Err(e) = submit.click() {
                    self.logger
                        .warn("login", &format!("submit click failed ({e}), pressing Enter"));
                    self.press_enter_on(&password);
                } else {
                    self.logger.info("login", "clicked submit button");
                }
            }
            None => {
                self.logger
                    .info("login", "submit button not found, pressing Enter instead");
                self.press_enter_on(&password);
            }
        }

        self.wait_for_outcome()
    }

    fn press_enter_on(&self, field: &headless_chrome::Element<'_>) {
        let sent = field
            .focus()
            .and_then(|_| self.tab.press_key("Enter"))
            .is_ok();
        if !sent {
            self.logger.error("login", "failed to press Enter on password field");
        }
    }

    fn wait_for_outcome(&self) -> LoginOutcome {
        let deadline = Deadline::from_now(self.timeout);

        let outcome = poll_until(deadline, Duration::from_secs(1), || {
            let current = self.tab.get_url();
            let url_moved = url_left_login(&current, &self.login_url);
            let success_marker = POST_LOGIN_MARKERS
                .iter()
                .any(|marker| page::text_visible(self.tab, marker));
            let error_marker = page::alert_text(self.tab)
                .map(|text| is_error_text(&text))
                .unwrap_or(false);

            classify(url_moved, success_marker, error_marker)
        });

        match outcome {
            Some(LoginOutcome::Success) => {
                self.logger
                    .info("login", &format!("login succeeded, now at {}", self.tab.get_url()));
                LoginOutcome::Success
            }
            Some(outcome) => {
                self.logger.error("login", "login rejected by the application");
                capture_diagnostic(self.tab, "login_error.png", self.logger);
                outcome
            }
            None => {
                self.logger.error("login", "timed out waiting for login result");
                capture_diagnostic(self.tab, "login_timeout.png", self.logger);
                LoginOutcome::TimedOut
            }
        }
    }
}
