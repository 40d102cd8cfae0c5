use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::{Dispatch, Level};

/// Append-only diagnostic sink for one run.
///
/// Events emitted inside [`DiagnosticLog::in_scope`] on the calling thread go
/// to this sink instead of any global subscriber.
#[derive(Clone)]
pub struct DiagnosticLog {
    dispatch: Dispatch,
}

impl DiagnosticLog {
    /// Log to `path` (created if missing, appended otherwise), one
    /// timestamped line per event at `level` or above.
    pub fn open(path: impl AsRef<Path>, level: Level) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        let subscriber = tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_level(true)
            .with_max_level(level)
            .finish();
        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }

    /// Discard all diagnostics.
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}
