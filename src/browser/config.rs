use std::time::Duration;

/// Configuration for the headless browser instance.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a visible window.
    pub headless: bool,

    /// Browser window size.
    pub window_width: u32,
    pub window_height: u32,

    /// Per-operation timeout applied to navigation waits.
    pub timeout: Duration,

    /// Disable image loading for faster page loads.
    pub disable_images: bool,

    /// Custom user agent, sent with every request.
    pub user_agent: Option<String>,

    /// How long the CDP connection may sit idle before it is torn down.
    /// Must comfortably exceed the longest poll interval in a run.
    pub idle_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 800,
            timeout: Duration::from_secs(30),
            disable_images: false,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl BrowserConfig {
    /// Configuration for debugging with a visible window.
    pub fn headed() -> Self {
        Self {
            headless: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.window_height, 800);
        assert!(config.user_agent.is_some());
    }

    #[test]
    fn test_headed_config() {
        let config = BrowserConfig::headed();
        assert!(!config.headless);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
