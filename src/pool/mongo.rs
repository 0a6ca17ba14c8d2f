//! MongoDB-backed sessions.
//!
//! The first session is dialed and verified with a ping before the pool is
//! built, so an unreachable deployment fails startup instead of the first
//! request. Derived sessions are clones of the driver client and share its
//! connection pool and server monitoring.

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::instrument;

use crate::config::DEFAULT_MONGO_URI;

use super::{DriverLogger, PoolError, Session, SessionError, SessionPool};

/// Application name reported to the server
const APP_NAME: &str = "mongo-probe";

/// Database used for liveness pings
const ADMIN_DATABASE: &str = "admin";

/// Session handle backed by a driver client
#[derive(Clone, Debug)]
pub struct MongoSession {
    client: Client,
}

impl MongoSession {
    /// Dial `uri` and confirm the deployment answers a ping.
    #[instrument(name = "mongo.dial", skip_all, fields(hosts))]
    pub async fn dial(uri: &str, logger: &DriverLogger) -> Result<Self, SessionError> {
        let uri = normalize_uri(uri);
        let mut options = ClientOptions::parse(uri.as_str()).await?;
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_string());
        }
        logger.install(&mut options);

        let hosts = options
            .hosts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        tracing::Span::current().record("hosts", hosts.as_str());

        let session = Self {
            client: Client::with_options(options)?,
        };
        session.ping().await?;

        tracing::info!(driver_log = logger.is_enabled(), "Connected to MongoDB");
        Ok(session)
    }
}

#[async_trait]
impl Session for MongoSession {
    async fn ping(&self) -> Result<(), SessionError> {
        self.client
            .database(ADMIN_DATABASE)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn count(&self, database: &str, collection: &str) -> Result<u64, SessionError> {
        let count = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await?;
        Ok(count)
    }

    fn derive(&self) -> Result<Self, SessionError> {
        Ok(self.clone())
    }
}

impl SessionPool<MongoSession> {
    /// Dial `uri` once and derive the rest of a `size`-session pool from it.
    pub async fn connect(uri: &str, size: usize, logger: DriverLogger) -> Result<Self, PoolError> {
        let first = MongoSession::dial(uri, &logger)
            .await
            .map_err(PoolError::Dial)?;
        let pool = Self::from_first(first, size)?;
        tracing::debug!(sessions = pool.len(), "Derived pooled sessions");
        Ok(pool)
    }
}

/// Turn a command-line target into a connection string the driver accepts.
///
/// An empty target means the local default server, and a bare host list
/// (`host1:27017,host2/db`) gets the `mongodb://` scheme.
pub fn normalize_uri(uri: &str) -> String {
    let uri = uri.trim();
    if uri.is_empty() {
        DEFAULT_MONGO_URI.to_string()
    } else if uri.contains("://") {
        uri.to_string()
    } else {
        format!("mongodb://{uri}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_empty_uses_localhost() {
        assert_eq!(normalize_uri(""), DEFAULT_MONGO_URI);
        assert_eq!(normalize_uri("   "), DEFAULT_MONGO_URI);
    }

    #[test]
    fn test_normalize_adds_scheme_to_host_list() {
        assert_eq!(normalize_uri("db1:27017"), "mongodb://db1:27017");
        assert_eq!(
            normalize_uri("db1,db2/app?replicaSet=rs0"),
            "mongodb://db1,db2/app?replicaSet=rs0"
        );
    }

    #[test]
    fn test_normalize_keeps_explicit_scheme() {
        assert_eq!(
            normalize_uri("mongodb+srv://cluster.example.net"),
            "mongodb+srv://cluster.example.net"
        );
        assert_eq!(normalize_uri(" mongodb://db:1 "), "mongodb://db:1");
    }

    #[tokio::test]
    async fn test_dial_rejects_malformed_uri() {
        let result =
            MongoSession::dial("mongodb://db:27017/?serverSelectionTimeoutMS=soon", &DriverLogger::disabled())
                .await;
        assert!(matches!(result, Err(SessionError::Driver(_))));
    }

    #[tokio::test]
    async fn test_connect_fails_for_unreachable_server() {
        let result = SessionPool::connect(
            "127.0.0.1:1/?serverSelectionTimeoutMS=200",
            16,
            DriverLogger::disabled(),
        )
        .await;
        assert!(matches!(result, Err(PoolError::Dial(SessionError::Driver(_)))));
    }
}
