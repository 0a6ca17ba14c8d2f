//! Round-robin read check.

use axum::extract::State;

use crate::config::{TEST_COLLECTION, TEST_DATABASE};
use crate::error::AppError;
use crate::pool::{with_deadline, Session};
use crate::state::AppState;

/// Count the test collection on the next session in round-robin order.
#[tracing::instrument(name = "routes.test", skip_all, fields(index))]
pub async fn test<S: Session>(State(state): State<AppState<S>>) -> Result<String, AppError> {
    let index = state.cursor.next_index();
    tracing::Span::current().record("index", index);

    let session = state
        .pool
        .get(index)
        .ok_or_else(|| AppError::Internal(format!("no session in slot {index}")))?;

    let count = with_deadline(
        state.request_timeout,
        session.count(TEST_DATABASE, TEST_COLLECTION),
    )
    .await
    .map_err(|source| AppError::TestFailed { index, source })?;

    tracing::debug!(count, "Count succeeded");
    Ok(format!("Test Success on {index}"))
}
