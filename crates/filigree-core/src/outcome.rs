// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Public outcome taxonomy.
//
// Every internal error is mapped to one of four outcomes a caller may see.
// Client-correctable problems keep a descriptive message; server-side
// failures are reported generically so no method or storage internals leak.

use serde_json::{Value, json};

use crate::error::{FiligreeError, MethodError};

/// What a caller is told when a request does not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No or invalid credentials. Checked before any document lookup.
    Unauthenticated,
    /// Malformed request, unknown method, not applicable, no watermark,
    /// or key mismatch.
    InvalidRequest(String),
    /// Document missing or owned by somebody else; indistinguishable.
    NotFound,
    /// The selected method or the backing store failed.
    InternalFailure,
}

impl Outcome {
    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::InvalidRequest(_) => 400,
            Self::NotFound => 404,
            Self::InternalFailure => 500,
        }
    }

    /// Short machine-readable label, used by the audit trail.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidRequest(_) => "invalid-request",
            Self::NotFound => "not-found",
            Self::InternalFailure => "internal-failure",
        }
    }

    /// Message placed in the response body's `error` field.
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated => "authentication required",
            Self::InvalidRequest(message) => message,
            Self::NotFound => "document not found",
            Self::InternalFailure => "internal server error",
        }
    }

    /// JSON response body: `{"error": "..."}`.
    pub fn body(&self) -> Value {
        json!({ "error": self.message() })
    }
}

impl From<&FiligreeError> for Outcome {
    fn from(err: &FiligreeError) -> Self {
        classify(err)
    }
}

impl From<FiligreeError> for Outcome {
    fn from(err: FiligreeError) -> Self {
        classify(&err)
    }
}

/// Reclassify an internal error into the outcome a caller sees.
pub fn classify(err: &FiligreeError) -> Outcome {
    match err {
        FiligreeError::Unauthenticated => Outcome::Unauthenticated,

        FiligreeError::InvalidRequest(detail) => Outcome::InvalidRequest(detail.clone()),

        FiligreeError::DocumentNotFound => Outcome::NotFound,

        FiligreeError::VersionNotFound => Outcome::NotFound,

        FiligreeError::UnknownMethod(name) => {
            Outcome::InvalidRequest(format!("unknown watermarking method: {name}"))
        }

        FiligreeError::NotApplicable(_) => {
            Outcome::InvalidRequest("method not applicable to this document".into())
        }

        FiligreeError::NoWatermark => Outcome::InvalidRequest("no watermark present".into()),

        // A method that cannot find a watermark under this key means the
        // caller supplied the wrong key or method.
        FiligreeError::Method(MethodError::NotFound(_)) => {
            Outcome::InvalidRequest("no watermark matches the supplied method and key".into())
        }

        FiligreeError::Method(MethodError::Failed(_))
        | FiligreeError::MethodAborted(_)
        | FiligreeError::PdfError(_)
        | FiligreeError::Sealing(_)
        | FiligreeError::IntegrityMismatch { .. }
        | FiligreeError::Database(_)
        | FiligreeError::Io(_)
        | FiligreeError::Serialization(_) => Outcome::InternalFailure,
    }
}
