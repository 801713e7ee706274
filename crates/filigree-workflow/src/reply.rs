// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendering of workflow results as a status code plus JSON body, for
// whatever transport sits in front of the engine.

use filigree_core::outcome::Outcome;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;

/// An HTTP-equivalent response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    /// `value` as the body with `status`. A value that cannot be serialised
    /// becomes an internal failure.
    pub fn success<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!(error = %e, "failed to serialise response");
                Self::failure(&Outcome::InternalFailure)
            }
        }
    }

    /// Status and `{"error": ..}` body for a failed request.
    pub fn failure(outcome: &Outcome) -> Self {
        Self {
            status: outcome.status_code(),
            body: outcome.body(),
        }
    }

    /// Render a workflow result, using `success_status` when it is `Ok`.
    pub fn from_result<T: Serialize>(result: Result<T, Outcome>, success_status: u16) -> Self {
        match result {
            Ok(value) => Self::success(success_status, &value),
            Err(outcome) => Self::failure(&outcome),
        }
    }

    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_and_failure_rendering() {
        let ok = Reply::from_result(Ok::<_, Outcome>(json!({"secret": "s"})), STATUS_CREATED);
        assert_eq!(ok.status, 201);
        assert!(ok.is_success());
        assert_eq!(ok.body["secret"], "s");

        let err = Reply::from_result(Err::<Value, _>(Outcome::NotFound), STATUS_CREATED);
        assert_eq!(err.status, 404);
        assert!(!err.is_success());
        assert!(err.body.get("error").is_some());
    }
}
