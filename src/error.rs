use std::io;
use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::pool::{PoolError, SessionError};

/// Failure at the request boundary.
///
/// The slot index and the raw driver message are part of the response body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Ping Failed on {index}: {source}")]
    PingFailed { index: usize, source: SessionError },

    #[error("Test Failed on {index}: {source}")]
    TestFailed { index: usize, source: SessionError },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::PingFailed { index, source } | AppError::TestFailed { index, source } => {
                tracing::warn!(index, error = %source, "Session probe failed");
            }
            AppError::Internal(_) => {
                tracing::error!("Internal error: {:?}", self);
            }
        }

        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Fatal error before the server starts accepting requests
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}
