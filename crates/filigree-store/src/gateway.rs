// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits consumed by the workflow engine.

use filigree_core::error::Result;
use filigree_core::types::{Artifact, DocumentId, NewArtifact, StoredArtifact, StoredDocument, UserId};

/// Resolves documents and persists watermark artifacts.
///
/// Implementations report *existence*; ownership is decided by the caller
/// so that "missing" and "not yours" can be folded into one outcome.
pub trait DocumentGateway: Send + Sync {
    /// Load a document and its original bytes.
    fn load_document(&self, id: DocumentId) -> Result<Option<StoredDocument>>;

    /// Persist a new artifact. Earlier artifacts of the same document are
    /// kept.
    fn insert_artifact(&self, artifact: NewArtifact) -> Result<Artifact>;

    /// The newest artifact of `document`. When `preferred_method` is given,
    /// the newest artifact produced by that method wins over newer ones
    /// produced by other methods.
    fn latest_artifact(
        &self,
        document: DocumentId,
        preferred_method: Option<&str>,
    ) -> Result<Option<StoredArtifact>>;

    /// Every artifact of `document`, newest first, without bytes.
    fn list_artifacts(&self, document: DocumentId) -> Result<Vec<Artifact>>;

    /// Artifact addressed by the token at the end of its access link.
    fn artifact_by_link(&self, link_token: &str) -> Result<Option<StoredArtifact>>;
}

/// Maps a bearer token to the user it was issued to.
pub trait Authenticator: Send + Sync {
    /// `Ok(None)` for unknown tokens.
    fn authenticate(&self, token: &str) -> Result<Option<UserId>>;
}
