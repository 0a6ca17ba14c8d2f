//! Shared application state for request handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::pool::{RoundRobin, Session, SessionPool};

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the session pool, the round-robin cursor used by /test, and the
/// optional per-operation deadline.
pub struct AppState<S> {
    pub pool: Arc<SessionPool<S>>,
    pub cursor: Arc<RoundRobin>,
    pub request_timeout: Option<Duration>,
}

impl<S: Session> AppState<S> {
    /// Creates a new application state with a cursor starting at zero.
    pub fn new(pool: SessionPool<S>, request_timeout: Option<Duration>) -> Self {
        let cursor = RoundRobin::new(pool.capacity());
        Self {
            pool: Arc::new(pool),
            cursor: Arc::new(cursor),
            request_timeout,
        }
    }
}

// Manual impl: cloning the state must not require `S: Clone`
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            cursor: self.cursor.clone(),
            request_timeout: self.request_timeout,
        }
    }
}
