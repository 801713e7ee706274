// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark workflow engine.
//
// Each request is an independent unit of work; the service holds nothing
// between requests except the method registry and handles to its
// collaborators. Internal errors are classified into the public `Outcome`
// taxonomy at the edge of every public operation.
//
// Gateway, authenticator and method calls are synchronous and run on the
// blocking pool. The audit log is rusqlite-backed and therefore `Send` but
// not `Sync`, so it sits behind `Arc<Mutex<>>`. The lock is never held
// across a method call.

use std::sync::{Arc, Mutex, PoisonError};

use filigree_core::AppConfig;
use filigree_core::error::{FiligreeError, Result};
use filigree_core::outcome::Outcome;
use filigree_core::types::{
    DocumentId, MethodInfo, NewArtifact, StoredDocument, UserId, VersionInfo, access_link,
};
use filigree_methods::MethodRegistry;
use filigree_security::audit::{AuditEvent, AuditLog};
use filigree_security::integrity::{key_fingerprint, verify_hash};
use filigree_store::{Authenticator, DocumentGateway};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::isolation::{run_method, run_predicate, run_store};
use crate::request::{CreatePayload, ReadPayload};

const ACTION_CREATE: &str = "create-watermark";
const ACTION_READ: &str = "read-watermark";

/// Successful create-watermark result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub documentid: DocumentId,
    pub link: String,
}

/// Successful read-watermark result.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub secret: String,
}

impl std::fmt::Debug for ReadResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadResponse").finish_non_exhaustive()
    }
}

/// What became known about a request before it finished; feeds the audit
/// trail.
#[derive(Debug, Default)]
struct RequestTrace {
    document: Option<DocumentId>,
    method: Option<String>,
    document_hash: Option<String>,
}

/// The create/read workflow engine.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct WatermarkService {
    registry: Arc<MethodRegistry>,
    documents: Arc<dyn DocumentGateway>,
    auth: Arc<dyn Authenticator>,
    audit_log: Option<Arc<Mutex<AuditLog>>>,
    config: AppConfig,
}

impl WatermarkService {
    /// Build an engine without an audit log; see [`Self::with_audit_log`].
    pub fn new(
        registry: Arc<MethodRegistry>,
        documents: Arc<dyn DocumentGateway>,
        auth: Arc<dyn Authenticator>,
        config: AppConfig,
    ) -> Self {
        Self {
            registry,
            documents,
            auth,
            audit_log: None,
            config,
        }
    }

    /// Record every authenticated create/read in `log`. Ignored when the
    /// configuration disables auditing.
    pub fn with_audit_log(mut self, log: AuditLog) -> Self {
        if self.config.audit_enabled {
            self.audit_log = Some(Arc::new(Mutex::new(log)));
        }
        self
    }

    /// The registry this engine resolves methods from. Registrations made
    /// through it are visible to the next request.
    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    /// Settings this engine was built with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // -- Create --------------------------------------------------------------

    /// Embed `secret` into a copy of the caller's document and persist it
    /// as a new artifact.
    #[instrument(skip_all, fields(document = ?document_id))]
    pub async fn create_watermark(
        &self,
        token: Option<&str>,
        document_id: Option<&str>,
        body: &Value,
    ) -> std::result::Result<CreateResponse, Outcome> {
        let user = self.authenticate(token).await?;
        let mut trace = RequestTrace::default();
        let result = self.create_for(user, document_id, body, &mut trace).await;
        self.finish(ACTION_CREATE, user, &trace, result)
    }

    async fn create_for(
        &self,
        user: UserId,
        document_id: Option<&str>,
        body: &Value,
        trace: &mut RequestTrace,
    ) -> Result<CreateResponse> {
        let id = DocumentId::parse(document_id)?;
        trace.document = Some(id);

        let document = self.owned_document(user, id).await?;
        trace.document_hash = Some(document.meta.sha256.clone());

        let payload = CreatePayload::from_json(body, self.config.max_secret_len)?;
        trace.method = Some(payload.method.clone());

        let method = self.registry.resolve(&payload.method)?;
        let bytes: Arc<[u8]> = document.bytes.into();

        let applicable = {
            let (method, bytes, position) =
                (Arc::clone(&method), Arc::clone(&bytes), payload.position.clone());
            run_predicate(&payload.method, move || {
                method.is_watermark_applicable(&bytes, position.as_deref())
            })
            .await?
        };
        if !applicable {
            return Err(FiligreeError::NotApplicable(payload.method));
        }

        let fingerprint = key_fingerprint(&payload.key);
        let marked = {
            let CreatePayload { secret, key, position, .. } = payload.clone();
            let method = Arc::clone(&method);
            run_method(&payload.method, move || {
                method.add_watermark(&bytes, &secret, &key, position.as_deref())
            })
            .await?
        };

        let new_artifact = NewArtifact {
            document_id: id,
            owner: user,
            method: payload.method,
            intended_for: payload.intended_for,
            key_fingerprint: fingerprint,
            bytes: marked,
        };
        let documents = Arc::clone(&self.documents);
        let artifact =
            run_store("insert-artifact", move || documents.insert_artifact(new_artifact)).await?;

        info!(document = %id, version = artifact.id, method = %artifact.method, "watermark created");
        Ok(CreateResponse {
            documentid: id,
            link: access_link(&self.config.link_base, &artifact.link_token),
        })
    }

    // -- Read ----------------------------------------------------------------

    /// Recover the secret from the caller's most recent watermarked version
    /// of a document.
    #[instrument(skip_all, fields(document = ?document_id))]
    pub async fn read_watermark(
        &self,
        token: Option<&str>,
        document_id: Option<&str>,
        body: &Value,
    ) -> std::result::Result<ReadResponse, Outcome> {
        let user = self.authenticate(token).await?;
        let mut trace = RequestTrace::default();
        let result = self.read_for(user, document_id, body, &mut trace).await;
        self.finish(ACTION_READ, user, &trace, result)
    }

    async fn read_for(
        &self,
        user: UserId,
        document_id: Option<&str>,
        body: &Value,
        trace: &mut RequestTrace,
    ) -> Result<ReadResponse> {
        let id = DocumentId::parse(document_id)?;
        trace.document = Some(id);

        let document = self.owned_document(user, id).await?;
        trace.document_hash = Some(document.meta.sha256);

        let payload = ReadPayload::from_json(body)?;
        trace.method = Some(payload.method.clone());

        let method = self.registry.resolve(&payload.method)?;

        let artifact = {
            let (documents, preferred) = (Arc::clone(&self.documents), payload.method.clone());
            run_store("latest-artifact", move || {
                documents.latest_artifact(id, Some(&preferred))
            })
            .await?
            .ok_or(FiligreeError::NoWatermark)?
        };
        debug!(version = artifact.meta.id, made_by = %artifact.meta.method, "reading version");

        let ReadPayload { method: name, key } = payload;
        let secret = run_method(&name, move || method.read_secret(&artifact.bytes, &key)).await?;

        info!(document = %id, method = %name, "watermark read");
        Ok(ReadResponse { secret })
    }

    // -- Queries -------------------------------------------------------------

    /// Every registered method, sorted by name.
    pub fn list_methods(&self) -> Vec<MethodInfo> {
        self.registry.list()
    }

    /// Watermarked versions of the caller's document, newest first.
    #[instrument(skip_all, fields(document = ?document_id))]
    pub async fn list_versions(
        &self,
        token: Option<&str>,
        document_id: Option<&str>,
    ) -> std::result::Result<Vec<VersionInfo>, Outcome> {
        let user = self.authenticate(token).await?;
        self.versions_for(user, document_id)
            .await
            .map_err(|e| log_failure("list-versions", e))
    }

    async fn versions_for(
        &self,
        user: UserId,
        document_id: Option<&str>,
    ) -> Result<Vec<VersionInfo>> {
        let id = DocumentId::parse(document_id)?;
        self.owned_document(user, id).await?;
        let documents = Arc::clone(&self.documents);
        let artifacts = run_store("list-artifacts", move || documents.list_artifacts(id)).await?;
        Ok(artifacts
            .iter()
            .map(|a| a.summary(&self.config.link_base))
            .collect())
    }

    /// Bytes of the version an access link points to. Links are bearer
    /// capabilities; no session is required.
    #[instrument(skip_all)]
    pub async fn get_version(&self, link: &str) -> std::result::Result<Vec<u8>, Outcome> {
        self.fetch_version(link)
            .await
            .map_err(|e| log_failure("get-version", e))
    }

    /// Accepts a full link or just its trailing token.
    async fn fetch_version(&self, link: &str) -> Result<Vec<u8>> {
        let token = link.trim().rsplit('/').next().unwrap_or_default().to_owned();
        if token.is_empty() {
            return Err(FiligreeError::VersionNotFound);
        }
        let documents = Arc::clone(&self.documents);
        let artifact = run_store("artifact-by-link", move || documents.artifact_by_link(&token))
            .await?
            .ok_or(FiligreeError::VersionNotFound)?;
        verify_hash(&artifact.bytes, &artifact.meta.sha256)?;

        debug!(version = artifact.meta.id, size = artifact.bytes.len(), "version fetched");
        Ok(artifact.bytes)
    }

    // -- Internals -----------------------------------------------------------

    async fn authenticate(&self, token: Option<&str>) -> std::result::Result<UserId, Outcome> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let Some(token) = token.map(str::to_owned) else {
            debug!("request without credentials");
            return Err(Outcome::Unauthenticated);
        };
        let auth = Arc::clone(&self.auth);
        match run_store("authenticate", move || auth.authenticate(&token)).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                debug!("unknown session token");
                Err(Outcome::Unauthenticated)
            }
            Err(e) => Err(log_failure("authenticate", e)),
        }
    }

    /// The document, if it exists and belongs to `user`. Both other cases
    /// yield the same `DocumentNotFound`.
    async fn owned_document(&self, user: UserId, id: DocumentId) -> Result<StoredDocument> {
        let documents = Arc::clone(&self.documents);
        match run_store("load-document", move || documents.load_document(id)).await? {
            Some(document) if document.meta.owner == user => Ok(document),
            _ => Err(FiligreeError::DocumentNotFound),
        }
    }

    fn finish<T>(
        &self,
        action: &str,
        user: UserId,
        trace: &RequestTrace,
        result: Result<T>,
    ) -> std::result::Result<T, Outcome> {
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => Outcome::from(e).label(),
        };
        self.audit(&AuditEvent {
            action,
            user,
            document: trace.document,
            method: trace.method.as_deref(),
            outcome,
            document_hash: trace.document_hash.as_deref(),
        });
        result.map_err(|e| log_failure(action, e))
    }

    fn audit(&self, event: &AuditEvent<'_>) {
        let Some(log) = &self.audit_log else {
            return;
        };
        let log = log.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = log.record(event) {
            error!(error = %e, "failed to record audit entry");
        }
    }
}

/// Classify `err`, logging server-side details the caller never sees.
fn log_failure(action: &str, err: FiligreeError) -> Outcome {
    let outcome = Outcome::from(&err);
    match outcome {
        Outcome::InternalFailure => error!(action, error = %err, "request failed"),
        _ => warn!(action, outcome = outcome.label(), error = %err, "request rejected"),
    }
    outcome
}
