//! Fixed-size pool of database sessions.
//!
//! A pool is built from one dialed session plus `size - 1` sessions derived from
//! it. Derived sessions share the driver's connection machinery with the first
//! one but can be used independently by concurrent requests. The pool never
//! grows, shrinks or reconnects after startup; a failed derivation aborts the
//! build instead of leaving a short pool behind.

mod cursor;
mod driver_log;
mod mongo;

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;

pub use cursor::RoundRobin;
pub use driver_log::DriverLogger;
pub use mongo::{normalize_uri, MongoSession};

/// A handle that can probe the database.
///
/// Implementations must be usable from many tasks at once; the pool hands out
/// shared references only.
#[async_trait]
pub trait Session: Send + Sync + Sized + 'static {
    /// Liveness probe against the server
    async fn ping(&self) -> Result<(), SessionError>;

    /// Count every document in `database.collection`
    async fn count(&self, database: &str, collection: &str) -> Result<u64, SessionError>;

    /// Produce another independent handle sharing this one's connection machinery
    fn derive(&self) -> Result<Self, SessionError>;
}

/// Error from a single database operation
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Raw driver error, displayed verbatim
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// Error while building the pool
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    Dial(SessionError),

    #[error("Failed to derive session {index}: {source}")]
    Derive {
        index: usize,
        #[source]
        source: SessionError,
    },

    #[error("Session pool size must be at least 1")]
    Empty,
}

/// Ordered, fixed-capacity collection of sessions
#[derive(Debug)]
pub struct SessionPool<S> {
    sessions: Vec<S>,
    capacity: NonZeroUsize,
}

impl<S: Session> SessionPool<S> {
    /// Build a pool of `size` sessions from an already established one.
    ///
    /// `first` occupies slot 0; slots 1.. are derived from it in order.
    pub fn from_first(first: S, size: usize) -> Result<Self, PoolError> {
        let capacity = NonZeroUsize::new(size).ok_or(PoolError::Empty)?;

        let mut sessions = Vec::with_capacity(size);
        sessions.push(first);
        for index in 1..size {
            let derived = sessions[0]
                .derive()
                .map_err(|source| PoolError::Derive { index, source })?;
            sessions.push(derived);
        }

        Ok(Self { sessions, capacity })
    }

    /// Get the session at `index`
    pub fn get(&self, index: usize) -> Option<&S> {
        self.sessions.get(index)
    }

    /// Iterate over `(index, session)` in pool order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &S)> {
        self.sessions.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Always false; a pool holds at least one session
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }
}

/// Run a database operation, bounded by `deadline` when one is configured
pub async fn with_deadline<T, F>(deadline: Option<Duration>, op: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, op)
            .await
            .map_err(|_| SessionError::Timeout(limit))?,
        None => op.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Session that counts derivations and can fail the n-th one
    #[derive(Debug)]
    struct CountingSession {
        id: usize,
        derived: Arc<AtomicUsize>,
        fail_at: Option<usize>,
    }

    impl CountingSession {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                id: 0,
                derived: Arc::new(AtomicUsize::new(0)),
                fail_at,
            }
        }
    }

    #[async_trait]
    impl Session for CountingSession {
        async fn ping(&self) -> Result<(), SessionError> {
            Ok(())
        }

        async fn count(&self, _database: &str, _collection: &str) -> Result<u64, SessionError> {
            Ok(0)
        }

        fn derive(&self) -> Result<Self, SessionError> {
            let id = self.derived.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_at == Some(id) {
                return Err(SessionError::Other(format!("clone {id} refused")));
            }
            Ok(Self {
                id,
                derived: self.derived.clone(),
                fail_at: self.fail_at,
            })
        }
    }

    #[test]
    fn test_pool_has_requested_size_in_order() {
        let pool = SessionPool::from_first(CountingSession::new(None), 16).unwrap();
        assert_eq!(pool.len(), 16);
        assert_eq!(pool.capacity().get(), 16);
        for (index, session) in pool.iter() {
            assert_eq!(session.id, index);
        }
        assert!(pool.get(16).is_none());
    }

    #[test]
    fn test_single_session_pool_derives_nothing() {
        let first = CountingSession::new(None);
        let derived = first.derived.clone();
        let pool = SessionPool::from_first(first, 1).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(derived.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_size_pool_is_rejected() {
        let err = SessionPool::from_first(CountingSession::new(None), 0).unwrap_err();
        assert!(matches!(err, PoolError::Empty));
    }

    #[test]
    fn test_derive_failure_is_fatal_and_names_slot() {
        let err = SessionPool::from_first(CountingSession::new(Some(7)), 16).unwrap_err();
        match err {
            PoolError::Derive { index, source } => {
                assert_eq!(index, 7);
                assert_eq!(source.to_string(), "clone 7 refused");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_with_deadline_passes_result_through() {
        let value = with_deadline(Some(Duration::from_secs(5)), async { Ok(42u64) })
            .await
            .unwrap();
        assert_eq!(value, 42);

        let err = with_deadline(None, async { Err::<u64, _>(SessionError::Other("boom".into())) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_expires() {
        let err = with_deadline(Some(Duration::from_secs(2)), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, SessionError::Timeout(d) if d == Duration::from_secs(2)));
        assert_eq!(err.to_string(), "operation timed out after 2s");
    }
}
