// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Filigree.

use thiserror::Error;

/// Failure reported by a watermarking method.
///
/// Methods never panic or throw to signal a problem; they return one of
/// these two tags and the workflow decides what the caller sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    /// No watermark matching the supplied key is present in the bytes.
    #[error("no watermark found: {0}")]
    NotFound(String),

    /// The algorithm itself failed while processing the bytes.
    #[error("watermarking method failed: {0}")]
    Failed(String),
}

/// Top-level error type for all Filigree operations.
#[derive(Debug, Error)]
pub enum FiligreeError {
    // -- Request errors --
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The document does not exist or is not owned by the caller. The two
    /// conditions are deliberately folded into one variant.
    #[error("document not found")]
    DocumentNotFound,

    #[error("watermark version not found")]
    VersionNotFound,

    // -- Method errors --
    #[error("unknown watermarking method: {0}")]
    UnknownMethod(String),

    #[error("method {0} is not applicable to this document")]
    NotApplicable(String),

    #[error("no watermark present for this document")]
    NoWatermark,

    #[error(transparent)]
    Method(#[from] MethodError),

    /// The method panicked instead of returning a `MethodError`.
    #[error("watermarking method {0} aborted")]
    MethodAborted(String),

    // -- Document / crypto --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("sealing failed: {0}")]
    Sealing(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FiligreeError {
    /// Shorthand for building an [`FiligreeError::InvalidRequest`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FiligreeError>;
