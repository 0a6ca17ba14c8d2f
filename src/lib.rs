//! mongo-probe: HTTP connectivity checks for a MongoDB deployment.
//!
//! One session is dialed at startup and fifteen more are derived from it. `/ping`
//! pings every pooled session in order; `/test` counts a fixed collection on one
//! session chosen round-robin.

pub mod config;
pub mod error;
pub mod middleware;
pub mod pool;
pub mod routes;
pub mod state;

pub use error::{AppError, StartupError};
