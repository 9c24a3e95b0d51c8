//! Shared state for API handlers.

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::store::ResultStore;

/// Dependency bundle handed to every route handler.
///
/// Everything here is constructed once in `main` and passed in explicitly;
/// no handler reaches for process-wide state.
pub struct ApiState {
    pub config: Config,
    pub store: ResultStore,
    pub dispatcher: Dispatcher,
    pub analyzer: Analyzer,
    pub started_at: std::time::Instant,
}
