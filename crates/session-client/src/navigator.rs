//! Navigation seam for landing-view redirects.

use parking_lot::Mutex;
use tracing::debug;

/// Moves the user to another view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Records every navigation in order. The last entry is the current view.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str) {
        debug!(path = %path, "Navigate");
        self.history.lock().push(path.to_string());
    }
}
