// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runs watermarking method calls and store calls on the blocking pool.
//
// A panicking method surfaces as an error instead of tearing down the
// caller, and synchronous rusqlite work stays off the async executor.

use filigree_core::error::{FiligreeError, MethodError, Result};
use tracing::error;

/// Run a fallible method call in isolation.
pub(crate) async fn run_method<T, F>(method: &str, call: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, MethodError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(result) => result.map_err(FiligreeError::from),
        Err(join) if join.is_panic() => {
            error!(method, "watermarking method panicked");
            Err(FiligreeError::MethodAborted(method.to_owned()))
        }
        Err(join) => {
            error!(method, error = %join, "watermarking method cancelled");
            Err(FiligreeError::MethodAborted(method.to_owned()))
        }
    }
}

/// Evaluate an infallible method predicate in isolation.
pub(crate) async fn run_predicate<F>(method: &str, check: F) -> Result<bool>
where
    F: FnOnce() -> bool + Send + 'static,
{
    run_method(method, move || Ok(check())).await
}

/// Run a synchronous store or authenticator call on the blocking pool.
///
/// A call that panics or is cancelled becomes a `Database` error, which the
/// caller sees as an internal failure.
pub(crate) async fn run_store<T, F>(operation: &'static str, call: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(result) => result,
        Err(join) => {
            error!(operation, error = %join, "store call did not complete");
            Err(FiligreeError::Database(format!("{operation} did not complete")))
        }
    }
}
