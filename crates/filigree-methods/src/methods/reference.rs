// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reference methods with fixed, predictable behaviour. They are not
// registered by default; tests and integrators register them explicitly.

use filigree_core::error::MethodError;

use crate::method::WatermarkingMethod;
use crate::pdf::find_all;

const TEST_MARKER: &[u8] = b"\n%%TEST_WM:";

/// `test-success`: appends `\n%%TEST_WM:<hex(secret)>\n` and reads the first
/// such marker back. Ignores the key. The hex payload keeps secrets with line
/// breaks intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct SucceedingMethod;

impl WatermarkingMethod for SucceedingMethod {
    fn name(&self) -> &str {
        "test-success"
    }

    fn usage(&self) -> &str {
        "Test method that succeeds"
    }

    fn is_watermark_applicable(&self, _pdf: &[u8], _position: Option<&str>) -> bool {
        true
    }

    fn add_watermark(
        &self,
        pdf: &[u8],
        secret: &str,
        _key: &str,
        _position: Option<&str>,
    ) -> Result<Vec<u8>, MethodError> {
        let encoded = hex::encode(secret);
        let mut out = Vec::with_capacity(pdf.len() + TEST_MARKER.len() + encoded.len() + 1);
        out.extend_from_slice(pdf);
        out.extend_from_slice(TEST_MARKER);
        out.extend_from_slice(encoded.as_bytes());
        out.push(b'\n');
        Ok(out)
    }

    fn read_secret(&self, pdf: &[u8], _key: &str) -> Result<String, MethodError> {
        let start = find_all(pdf, TEST_MARKER)
            .first()
            .map(|pos| pos + TEST_MARKER.len())
            .ok_or_else(|| MethodError::NotFound("no test watermark found in PDF".into()))?;
        let rest = &pdf[start..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());

        let decoded = hex::decode(&rest[..end])
            .map_err(|e| MethodError::Failed(format!("test watermark is not hex: {e}")))?;
        String::from_utf8(decoded)
            .map_err(|e| MethodError::Failed(format!("test watermark is not UTF-8: {e}")))
    }
}

/// `test-fail`: always applicable, always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingMethod;

impl WatermarkingMethod for FailingMethod {
    fn name(&self) -> &str {
        "test-fail"
    }

    fn usage(&self) -> &str {
        "Test method that fails"
    }

    fn is_watermark_applicable(&self, _pdf: &[u8], _position: Option<&str>) -> bool {
        true
    }

    fn add_watermark(
        &self,
        _pdf: &[u8],
        _secret: &str,
        _key: &str,
        _position: Option<&str>,
    ) -> Result<Vec<u8>, MethodError> {
        Err(MethodError::Failed("watermarking failed on purpose".into()))
    }

    fn read_secret(&self, _pdf: &[u8], _key: &str) -> Result<String, MethodError> {
        Err(MethodError::Failed("cannot read from failed watermark".into()))
    }
}

/// `test-not-applicable`: never applicable. Embedding or reading anyway is
/// reported as a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotApplicableMethod;

impl WatermarkingMethod for NotApplicableMethod {
    fn name(&self) -> &str {
        "test-not-applicable"
    }

    fn usage(&self) -> &str {
        "Test method not applicable"
    }

    fn is_watermark_applicable(&self, _pdf: &[u8], _position: Option<&str>) -> bool {
        false
    }

    fn add_watermark(
        &self,
        _pdf: &[u8],
        _secret: &str,
        _key: &str,
        _position: Option<&str>,
    ) -> Result<Vec<u8>, MethodError> {
        Err(MethodError::Failed("called although not applicable".into()))
    }

    fn read_secret(&self, _pdf: &[u8], _key: &str) -> Result<String, MethodError> {
        Err(MethodError::Failed("called although not applicable".into()))
    }
}
