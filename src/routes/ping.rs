//! Liveness check across the whole pool.

use axum::extract::State;

use crate::config::PING_SUCCESS;
use crate::error::AppError;
use crate::pool::{with_deadline, Session};
use crate::state::AppState;

/// Ping every session in pool order.
///
/// Stops at the first session that fails; later sessions are not probed.
pub async fn ping<S: Session>(State(state): State<AppState<S>>) -> Result<&'static str, AppError> {
    for (index, session) in state.pool.iter() {
        with_deadline(state.request_timeout, session.ping())
            .await
            .map_err(|source| AppError::PingFailed { index, source })?;
    }

    tracing::debug!(sessions = state.pool.len(), "All sessions answered ping");
    Ok(PING_SUCCESS)
}
