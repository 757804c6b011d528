use std::fmt;

/// Control-plane failure: raised by setup and configuration calls, never by
/// a per-request search (those report through [`SearchResult`](crate::nav::types::SearchResult) instead).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    /// `NavConfig` contains a value that cannot produce a usable grid (e.g. zero cell size).
    InvalidConfig(&'static str),
    /// A control-plane call was made before `Dispatcher::init` completed.
    NotInitialized,
    /// The worker pool rejected a task outright (e.g. it has been shut down).
    WorkerPoolUnavailable,
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::InvalidConfig(reason) => write!(f, "invalid navigation config: {reason}"),
            NavError::NotInitialized => write!(f, "dispatcher not initialized"),
            NavError::WorkerPoolUnavailable => write!(f, "worker pool unavailable"),
        }
    }
}

impl std::error::Error for NavError {}
