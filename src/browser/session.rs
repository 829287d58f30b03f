use super::manager::BrowserError;
use headless_chrome::protocol::cdp::Network::CookieParam;
use headless_chrome::Tab;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted authentication material: the tab's cookie jar (raw CDP cookie
/// array) plus localStorage entries for the application origin.
///
/// Written after the first successful login, read back on later runs so the
/// login form can be skipped entirely.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: serde_json::Value,
    #[serde(default)]
    pub local_storage: Vec<(String, String)>,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        let no_cookies = match &self.cookies {
            serde_json::Value::Array(items) => items.is_empty(),
            _ => true,
        };
        no_cookies && self.local_storage.is_empty()
    }
}

/// Reads and writes the session file. The file contents are opaque to every
/// other module.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<SessionState, BrowserError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| BrowserError::Session(format!("read {}: {e}", self.path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| BrowserError::Session(format!("parse {}: {e}", self.path.display())))
    }

    pub fn save(&self, state: &SessionState) -> Result<(), BrowserError> {
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| BrowserError::Session(e.to_string()))?;
        fs::write(&self.path, content)
            .map_err(|e| BrowserError::Session(format!("write {}: {e}", self.path.display())))
    }
}

/// Snapshot the tab's cookies and localStorage.
pub fn capture(tab: &Tab) -> Result<SessionState, BrowserError> {
    let cookies = tab
        .get_cookies()
        .map_err(|e| BrowserError::Session(format!("read cookies: {e}")))?;
    let cookies =
        serde_json::to_value(&cookies).map_err(|e| BrowserError::Session(e.to_string()))?;

    let local_storage = tab
        .evaluate(
            "JSON.stringify(Object.entries(window.localStorage))",
            false,
        )
        .ok()
        .and_then(|r| r.value)
        .and_then(|v| v.as_str().map(|s| s.to_string()))
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default();

    Ok(SessionState {
        cookies,
        local_storage,
    })
}

/// Install persisted cookies into the tab. Safe before the first navigation;
/// each cookie carries its own domain.
pub fn restore_cookies(tab: &Tab, state: &SessionState) -> Result<(), BrowserError> {
    if state.cookies.is_null() {
        return Ok(());
    }
    let params: Vec<CookieParam> = serde_json::from_value(state.cookies.clone())
        .map_err(|e| BrowserError::Session(format!("decode cookies: {e}")))?;
    if params.is_empty() {
        return Ok(());
    }
    tab.set_cookies(params)
        .map_err(|e| BrowserError::Session(format!("set cookies: {e}")))
}

/// Install persisted localStorage entries. The application origin must be
/// loaded first; callers reload afterwards so the app boots with them.
pub fn restore_local_storage(tab: &Tab, state: &SessionState) -> Result<(), BrowserError> {
    if state.local_storage.is_empty() {
        return Ok(());
    }
    let entries = serde_json::to_string(&state.local_storage)
        .map_err(|e| BrowserError::Session(e.to_string()))?;
    let script = format!(
        "(() => {{ const items = {entries}; for (const [k, v] of items) localStorage.setItem(k, v); return items.length; }})()"
    );
    tab.evaluate(&script, false)
        .map_err(|e| BrowserError::Session(format!("restore localStorage: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(!store.exists());

        let state = SessionState {
            cookies: serde_json::json!([{"name": "sid", "value": "abc", "domain": "example.com"}]),
            local_storage: vec![("token".to_string(), "xyz".to_string())],
        };
        store.save(&state).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.cookies, state.cookies);
        assert_eq!(loaded.local_storage, state.local_storage);
        assert!(!loaded.is_empty());
    }

    #[test]
    fn tolerates_a_minimal_file() {
        let state: SessionState = serde_json::from_str("{}").unwrap();
        assert!(state.cookies.is_null());
        assert!(state.local_storage.is_empty());
        assert!(state.is_empty());
    }

    #[test]
    fn load_fails_cleanly_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_err());
    }
}
