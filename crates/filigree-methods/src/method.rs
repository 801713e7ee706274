// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The contract every watermarking algorithm implements.

use filigree_core::error::MethodError;

/// An interchangeable watermarking algorithm.
///
/// Implementations are stateless across calls and are shared between
/// requests behind an `Arc`, so a single instance may be invoked
/// concurrently for different documents. They must not write to shared or
/// global state; their only output is the returned bytes or string.
///
/// The contract is opaque about *how* a method embeds data. It only
/// requires that, for any document the method declared applicable,
/// `read_secret(add_watermark(doc, s, k, p)?, k) == Ok(s)` as long as the
/// watermarked bytes are passed back unmodified.
pub trait WatermarkingMethod: Send + Sync {
    /// Stable identifier, used as the registry key and as the `method`
    /// field in requests.
    fn name(&self) -> &str;

    /// Human-readable description for listings. Carries no behaviour.
    fn usage(&self) -> &str;

    /// Whether this method can act on `pdf`.
    ///
    /// Must be pure and cheap: the workflow calls it before every embed and
    /// never calls [`add_watermark`](Self::add_watermark) when it returns
    /// `false`.
    fn is_watermark_applicable(&self, pdf: &[u8], position: Option<&str>) -> bool;

    /// Embed `secret` into a copy of `pdf`, recoverable with `key`.
    ///
    /// Errors are reported as [`MethodError::Failed`].
    fn add_watermark(
        &self,
        pdf: &[u8],
        secret: &str,
        key: &str,
        position: Option<&str>,
    ) -> Result<Vec<u8>, MethodError>;

    /// Recover a secret previously embedded with `key`.
    ///
    /// Returns [`MethodError::NotFound`] when no watermark matching `key` is
    /// present, and [`MethodError::Failed`] for any other processing error.
    fn read_secret(&self, pdf: &[u8], key: &str) -> Result<String, MethodError>;
}
