// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Filigree.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FiligreeError;

/// Identifier of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl DocumentId {
    /// Parse a document id supplied by a caller (path segment or query
    /// parameter).
    ///
    /// An absent id and a malformed id are both rejected as invalid
    /// requests; only non-negative decimal integers are accepted.
    pub fn parse(raw: Option<&str>) -> Result<Self, FiligreeError> {
        let raw = raw.ok_or_else(|| FiligreeError::invalid("document id required"))?;
        raw.parse()
    }
}

impl FromStr for DocumentId {
    type Err = FiligreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FiligreeError::invalid("document id must be an integer"));
        }
        trimmed
            .parse::<i64>()
            .map(Self)
            .map_err(|_| FiligreeError::invalid("document id out of range"))
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata of an uploaded document. The raw bytes live in
/// [`StoredDocument`] and are never mutated after upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub owner: UserId,
    pub name: String,
    /// SHA-256 hex digest of the uploaded bytes.
    pub sha256: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// A document together with its original bytes.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub meta: Document,
    pub bytes: Vec<u8>,
}

/// Everything the workflow hands to the gateway when persisting a freshly
/// watermarked artifact.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub document_id: DocumentId,
    pub owner: UserId,
    pub method: String,
    pub intended_for: String,
    /// SHA-256 fingerprint of the embed key. The key itself is never stored.
    pub key_fingerprint: String,
    pub bytes: Vec<u8>,
}

/// Metadata of a persisted watermark artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: i64,
    pub document_id: DocumentId,
    pub owner: UserId,
    pub method: String,
    pub intended_for: String,
    pub key_fingerprint: String,
    /// SHA-256 hex digest of the watermarked bytes.
    pub sha256: String,
    /// Opaque token that forms the last segment of the access link.
    pub link_token: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Public listing entry; omits the owner and key fingerprint.
    pub fn summary(&self, link_base: &str) -> VersionInfo {
        VersionInfo {
            id: self.id,
            documentid: self.document_id,
            method: self.method.clone(),
            intended_for: self.intended_for.clone(),
            link: access_link(link_base, &self.link_token),
            created_at: self.created_at,
        }
    }
}

/// An artifact together with its watermarked bytes.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub meta: Artifact,
    pub bytes: Vec<u8>,
}

/// Listing entry for one watermarked version of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: i64,
    pub documentid: DocumentId,
    pub method: String,
    pub intended_for: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
}

/// Name and usage string of a registered watermarking method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub usage: String,
}

/// Join a link base (e.g. `/api/get-version`) and a link token.
pub fn access_link(link_base: &str, token: &str) -> String {
    format!("{}/{}", link_base.trim_end_matches('/'), token)
}
