// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request payload validation.
//
// Bodies arrive as loosely typed JSON. Every required field must be present
// and a string; anything else is an invalid request whose message names the
// offending field.

use filigree_core::error::{FiligreeError, Result};
use serde_json::{Map, Value};

/// Validated create-watermark payload.
#[derive(Clone, PartialEq, Eq)]
pub struct CreatePayload {
    pub method: String,
    pub intended_for: String,
    pub secret: String,
    pub key: String,
    pub position: Option<String>,
}

/// Validated read-watermark payload.
#[derive(Clone, PartialEq, Eq)]
pub struct ReadPayload {
    pub method: String,
    pub key: String,
}

// Secrets and keys must not end up in logs through `{:?}`.
impl std::fmt::Debug for CreatePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatePayload")
            .field("method", &self.method)
            .field("intended_for", &self.intended_for)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ReadPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadPayload")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl CreatePayload {
    /// Validate a create-watermark body. `max_secret_len` bounds the
    /// secret in bytes.
    pub fn from_json(body: &Value, max_secret_len: usize) -> Result<Self> {
        let fields = object(body)?;
        let payload = Self {
            method: required_str(fields, "method")?,
            intended_for: required_str(fields, "intended_for")?,
            secret: required_str(fields, "secret")?,
            key: required_str(fields, "key")?,
            position: optional_position(fields),
        };

        if payload.secret.is_empty() {
            return Err(FiligreeError::invalid("secret must not be empty"));
        }
        if payload.secret.len() > max_secret_len {
            return Err(FiligreeError::invalid(format!(
                "secret exceeds {max_secret_len} bytes"
            )));
        }
        if payload.key.is_empty() {
            return Err(FiligreeError::invalid("key must not be empty"));
        }
        Ok(payload)
    }
}

impl ReadPayload {
    /// Validate a read-watermark body.
    pub fn from_json(body: &Value) -> Result<Self> {
        let fields = object(body)?;
        let payload = Self {
            method: required_str(fields, "method")?,
            key: required_str(fields, "key")?,
        };
        if payload.key.is_empty() {
            return Err(FiligreeError::invalid("key must not be empty"));
        }
        Ok(payload)
    }
}

fn object(body: &Value) -> Result<&Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| FiligreeError::invalid("request body must be a JSON object"))
}

fn required_str(fields: &Map<String, Value>, name: &str) -> Result<String> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(FiligreeError::invalid(format!("missing field: {name}"))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(FiligreeError::invalid(format!("field {name} must be a string"))),
    }
}

/// `position` is opaque to the workflow and may hold any JSON value.
///
/// Strings pass through unchanged, null counts as absent, and every other
/// value is handed to the method in its compact JSON rendering. Whether a
/// position makes sense is the method's applicability decision.
fn optional_position(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("position")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
