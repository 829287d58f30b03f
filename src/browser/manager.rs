use super::config::BrowserConfig;
use crate::logging::Logger;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;

/// Errors that can occur while driving the browser.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("browser configuration error: {0}")]
    Configuration(String),

    #[error("tab creation failed: {0}")]
    Tab(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("script evaluation error: {0}")]
    Script(String),

    #[error("element interaction failed: {0}")]
    Interaction(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("session state error: {0}")]
    Session(String),
}

/// Script evaluated on every new tab to blunt the usual automation tells.
const STEALTH_JS: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined
    });
    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3, 4, 5]
    });
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en']
    });
    window.chrome = window.chrome || { runtime: {} };
"#;

/// Owns the browser instance and creates tabs for a run.
pub struct BrowserManager {
    browser: Browser,
    config: BrowserConfig,
}

impl BrowserManager {
    /// Launch Chrome with the given configuration.
    pub fn launch(config: BrowserConfig) -> Result<Self, BrowserError> {
        // Owned strings first, the args vec borrows them.
        let images_arg = config
            .disable_images
            .then(|| "--blink-settings=imagesEnabled=false".to_string());
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={ua}"));

        let mut args: Vec<&OsStr> = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-setuid-sandbox"),
        ];
        if let Some(ref img) = images_arg {
            args.push(OsStr::new(img));
        }
        if let Some(ref ua) = user_agent_arg {
            args.push(OsStr::new(ua));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(config.idle_timeout)
            .args(args)
            .build()
            .map_err(|e| BrowserError::Configuration(e.to_string()))?;

        let browser = Browser::new(launch_options).map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self { browser, config })
    }

    /// Create a tab with the stealth adjustments applied.
    pub fn new_tab(&self) -> Result<Arc<Tab>, BrowserError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| BrowserError::Tab(e.to_string()))?;

        tab.evaluate(STEALTH_JS, false)
            .map_err(|e| BrowserError::Script(e.to_string()))?;

        Ok(tab)
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }
}

/// Navigate the tab and block until the load settles.
pub fn navigate(tab: &Tab, url: &str) -> Result<(), BrowserError> {
    tab.navigate_to(url)
        .map_err(|e| BrowserError::Navigation(format!("failed to navigate to {url}: {e}")))?;
    tab.wait_until_navigated()
        .map_err(|e| BrowserError::Navigation(format!("navigation timeout for {url}: {e}")))?;

    // Re-apply after the document swap; evaluate-time injection does not
    // survive navigation.
    tab.evaluate(STEALTH_JS, false)
        .map_err(|e| BrowserError::Script(e.to_string()))?;

    Ok(())
}

/// Best-effort full-page screenshot for post-mortem diagnosis. Never fails
/// the caller; a screenshot that cannot be written is only logged.
pub fn capture_diagnostic(tab: &Tab, path: &str, logger: &dyn Logger) {
    let result = tab
        .capture_screenshot(
            headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
            None,
            None,
            true,
        )
        .map_err(|e| BrowserError::Screenshot(e.to_string()))
        .and_then(|data| {
            std::fs::write(path, data).map_err(|e| BrowserError::Screenshot(e.to_string()))
        });

    match result {
        Ok(()) => logger.debug("browser", &format!("saved screenshot: {path}")),
        Err(e) => logger.error("browser", &format!("failed to save screenshot {path}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires Chrome/Chromium
    fn test_browser_launch() {
        let manager = BrowserManager::launch(BrowserConfig::default());
        assert!(manager.is_ok(), "is Chrome/Chromium installed?");
    }

    #[test]
    #[ignore] // Requires Chrome/Chromium
    fn test_tab_creation_applies_stealth() {
        let manager = BrowserManager::launch(BrowserConfig::default()).unwrap();
        let tab = manager.new_tab().unwrap();

        let result = tab.evaluate("navigator.webdriver === undefined", false).unwrap();
        assert_eq!(result.value.and_then(|v| v.as_bool()), Some(true));
    }
}
