use crate::auth::{Credentials, LoginFlow, LoginOutcome};
use crate::browser::{self, session, BrowserError, BrowserManager, SessionStore};
use crate::catalog::CatalogTable;
use crate::collector::Collector;
use crate::config::Settings;
use crate::export;
use crate::logging::Logger;
use crate::models::RunSummary;
use crate::navigation::{catalog_path, NavigationError, Navigator};
use std::path::PathBuf;
use std::time::Duration;

/// Per-run identity: where to go, who to sign in as, where files live.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub base_url: String,
    pub credentials: Credentials,
    pub session_file: PathBuf,
    pub output_file: PathBuf,
    pub headless: bool,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("authentication {0}")]
    Authentication(LoginOutcome),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// One complete harvest: session restore, login, menu traversal, incremental
/// collection, export. Single attempt end to end; every hard failure is
/// diagnosed with a screenshot before it propagates.
pub fn run(
    options: &RunOptions,
    settings: &Settings,
    logger: &dyn Logger,
) -> Result<RunSummary, RunError> {
    logger.info(
        "session",
        &format!("launching browser (headless={})", options.headless),
    );
    let manager = BrowserManager::launch(
        settings
            .browser
            .to_browser_config(options.headless, options.timeout),
    )?;
    let tab = manager.new_tab()?;

    // Cookies go in before the first navigation; localStorage needs the
    // origin loaded, so it is applied after, followed by one reload.
    let store = SessionStore::new(&options.session_file);
    let mut restored = None;
    if store.exists() {
        match store.load() {
            Ok(state) if !state.is_empty() => {
                logger.info(
                    "session",
                    &format!("loading session state from {}", store.path().display()),
                );
                if let Err(e) = session::restore_cookies(&tab, &state) {
                    logger.warn("session", &format!("cookie restore failed: {e}"));
                } else {
                    restored = Some(state);
                }
            }
            Ok(_) => logger.debug("session", "session file is empty, ignoring"),
            Err(e) => logger.warn("session", &format!("session restore failed: {e}")),
        }
    }

    browser::navigate(&tab, &options.base_url)?;

    if let Some(state) = &restored {
        if !state.local_storage.is_empty() {
            match session::restore_local_storage(&tab, state) {
                Ok(()) => {
                    if let Err(e) = tab
                        .reload(false, None)
                        .and_then(|t| t.wait_until_navigated())
                    {
                        logger.warn("session", &format!("reload after restore failed: {e}"));
                    }
                }
                Err(e) => logger.warn("session", &format!("localStorage restore failed: {e}")),
            }
        }
    }

    let login = LoginFlow::new(&tab, logger, options.base_url.clone(), options.timeout);
    let reused_session = login.already_authenticated();
    if reused_session {
        logger.info("session", "already logged in with existing session");
    } else {
        logger.info("session", "no valid session found, attempting login");
        match login.sign_in(&options.credentials) {
            LoginOutcome::Success => match session::capture(&tab) {
                Ok(state) => match store.save(&state) {
                    Ok(()) => logger.info(
                        "session",
                        &format!("saved session state to {}", store.path().display()),
                    ),
                    Err(e) => logger.warn("session", &format!("failed to save session: {e}")),
                },
                Err(e) => logger.warn("session", &format!("failed to capture session: {e}")),
            },
            outcome => return Err(RunError::Authentication(outcome)),
        }
    }

    let navigator = Navigator::new(&tab, logger);
    if let Err(e) = navigator.run(&catalog_path()) {
        browser::capture_diagnostic(&tab, "navigation_failed.png", logger);
        return Err(e.into());
    }

    let table = CatalogTable::new(&tab, logger);
    let collector = Collector::new(settings.collector.to_params(), logger);
    let rows = collector.collect(&table);

    let exported = match export::write_rows(&options.output_file, &rows) {
        Ok(()) => {
            logger.info(
                "export",
                &format!(
                    "exported {} rows to {}",
                    rows.len(),
                    options.output_file.display()
                ),
            );
            true
        }
        Err(e) => {
            logger.error(
                "export",
                &format!("failed to write {}: {e}", options.output_file.display()),
            );
            false
        }
    };

    Ok(RunSummary {
        rows_collected: rows.len(),
        exported,
        reused_session,
    })
}
