use crate::browser::BrowserConfig;
use crate::collector::CollectorParams;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Tuning knobs read from an optional `config.toml` next to the binary.
/// Everything has a sensible default; the file only needs the keys being
/// overridden.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub browser: BrowserTuning,
    #[serde(default)]
    pub collector: CollectorTuning,
}

impl Settings {
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                if let Ok(settings) = toml::from_str::<Settings>(&content) {
                    return settings;
                }
            }
        }
        Self::default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserTuning {
    /// Browser window size
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Disable image loading for performance
    #[serde(default = "default_false")]
    pub disable_images: bool,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// CDP idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorTuning {
    /// Hard ceiling on scroll iterations
    #[serde(default = "default_max_attempts")]
    pub max_scroll_attempts: usize,

    /// Consecutive empty extraction rounds before stopping
    #[serde(default = "default_empty_rounds")]
    pub empty_round_threshold: usize,

    /// Extract rows every k-th scroll
    #[serde(default = "default_extract_every")]
    pub extract_every: usize,

    /// Run completion checks every m-th scroll
    #[serde(default = "default_completion_every")]
    pub completion_check_every: usize,

    /// Empty rounds needed for the early exit shortcut
    #[serde(default = "default_early_exit_rounds")]
    pub early_exit_rounds: usize,

    /// Scrolls that must elapse before the early exit applies
    #[serde(default = "default_min_attempts")]
    pub min_attempts: usize,

    /// Pause after each scroll in milliseconds
    #[serde(default = "default_scroll_delay")]
    pub scroll_delay_ms: u64,

    /// Distance from the maximum scroll position still counted as the end
    #[serde(default = "default_end_slack")]
    pub end_slack_px: f64,
}

fn default_false() -> bool { false }
fn default_window_width() -> u32 { 1280 }
fn default_window_height() -> u32 { 800 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36"
        .to_string()
}
fn default_idle_timeout() -> u64 { 300 }
fn default_max_attempts() -> usize { 500 }
fn default_empty_rounds() -> usize { 5 }
fn default_extract_every() -> usize { 3 }
fn default_completion_every() -> usize { 15 }
fn default_early_exit_rounds() -> usize { 2 }
fn default_min_attempts() -> usize { 50 }
fn default_scroll_delay() -> u64 { 300 }
fn default_end_slack() -> f64 { 100.0 }

impl Default for BrowserTuning {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            disable_images: false,
            user_agent: default_user_agent(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for CollectorTuning {
    fn default() -> Self {
        Self {
            max_scroll_attempts: default_max_attempts(),
            empty_round_threshold: default_empty_rounds(),
            extract_every: default_extract_every(),
            completion_check_every: default_completion_every(),
            early_exit_rounds: default_early_exit_rounds(),
            min_attempts: default_min_attempts(),
            scroll_delay_ms: default_scroll_delay(),
            end_slack_px: default_end_slack(),
        }
    }
}

impl BrowserTuning {
    pub fn to_browser_config(&self, headless: bool, timeout: Duration) -> BrowserConfig {
        BrowserConfig {
            headless,
            window_width: self.window_width,
            window_height: self.window_height,
            timeout,
            disable_images: self.disable_images,
            user_agent: Some(self.user_agent.clone()),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}

impl CollectorTuning {
    pub fn to_params(&self) -> CollectorParams {
        CollectorParams {
            max_attempts: self.max_scroll_attempts,
            empty_round_threshold: self.empty_round_threshold,
            extract_every: self.extract_every,
            completion_check_every: self.completion_check_every,
            early_exit_rounds: self.early_exit_rounds,
            min_attempts: self.min_attempts,
            scroll_delay: Duration::from_millis(self.scroll_delay_ms),
            end_slack: self.end_slack_px,
        }
    }
}
