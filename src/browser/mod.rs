//! Headless browser lifecycle and session persistence.
//!
//! Everything that talks CDP lives behind this module; the flows above it
//! only see tabs, elements and typed errors.

pub mod config;
pub mod manager;
pub mod session;

pub use config::BrowserConfig;
pub use manager::{capture_diagnostic, navigate, BrowserError, BrowserManager};
pub use session::{SessionState, SessionStore};
