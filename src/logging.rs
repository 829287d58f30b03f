use log::Level;

/// Logging capability handed to each component at construction time.
///
/// Components never touch the global `log` facade themselves; the binary
/// decides where events go by choosing the implementation. `scope` is a short
/// component tag ("login", "nav", "collect") used as the log target.
pub trait Logger: Sync {
    fn log(&self, level: Level, scope: &str, message: &str);

    fn debug(&self, scope: &str, message: &str) {
        self.log(Level::Debug, scope, message);
    }

    fn info(&self, scope: &str, message: &str) {
        self.log(Level::Info, scope, message);
    }

    fn warn(&self, scope: &str, message: &str) {
        self.log(Level::Warn, scope, message);
    }

    fn error(&self, scope: &str, message: &str) {
        self.log(Level::Error, scope, message);
    }
}

/// Production logger: forwards to the `log` macros with the scope as target,
/// so log4rs patterns can render it via `{t}`.
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn log(&self, level: Level, scope: &str, message: &str) {
        log::log!(target: scope, level, "{message}");
    }
}

/// Discards everything. Handy for integration tests that only care about
/// return values.
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _scope: &str, _message: &str) {}
}
