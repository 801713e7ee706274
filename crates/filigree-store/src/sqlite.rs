// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite-backed store for users, sessions, documents and watermark versions.
//
// Document and artifact bytes are kept in BLOB columns next to their
// metadata. `rusqlite::Connection` is `Send` but not `Sync`, so it sits
// behind a `Mutex`; every query is short, so contention stays low.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use filigree_core::error::{FiligreeError, Result};
use filigree_core::types::{
    Artifact, Document, DocumentId, NewArtifact, StoredArtifact, StoredDocument, UserId,
};
use filigree_security::integrity::hash_bytes;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::gateway::{Authenticator, DocumentGateway};

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        login      TEXT    NOT NULL UNIQUE,
        created_at TEXT    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS sessions (
        token      TEXT    PRIMARY KEY,
        user_id    INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS documents (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id   INTEGER NOT NULL REFERENCES users(id),
        name       TEXT    NOT NULL,
        sha256     TEXT    NOT NULL,
        size       INTEGER NOT NULL,
        created_at TEXT    NOT NULL,
        bytes      BLOB    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS versions (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id     INTEGER NOT NULL REFERENCES documents(id),
        owner_id        INTEGER NOT NULL REFERENCES users(id),
        method          TEXT    NOT NULL,
        intended_for    TEXT    NOT NULL,
        key_fingerprint TEXT    NOT NULL,
        sha256          TEXT    NOT NULL,
        link_token      TEXT    NOT NULL UNIQUE,
        created_at      TEXT    NOT NULL,
        bytes           BLOB    NOT NULL
    );
    CREATE INDEX IF NOT EXISTS versions_document ON versions (document_id);
"#;

const ARTIFACT_COLUMNS: &str = "id, document_id, owner_id, method, intended_for, \
                                key_fingerprint, sha256, link_token, created_at";

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> FiligreeError + '_ {
    move |e| FiligreeError::Database(format!("{context}: {e}"))
}

/// Persistent store backed by a single SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(db_err("foreign_keys pragma"))?;
        conn.execute_batch(SCHEMA_SQL).map_err(db_err("create schema"))?;

        info!("document store opened");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open in-memory"))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(db_err("foreign_keys pragma"))?;
        conn.execute_batch(SCHEMA_SQL).map_err(db_err("create schema"))?;

        debug!("in-memory document store opened");
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Users and sessions --------------------------------------------------

    /// Create a user with a unique login.
    #[instrument(skip(self))]
    pub fn create_user(&self, login: &str) -> Result<UserId> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (login, created_at) VALUES (?1, ?2)",
            params![login, Utc::now().to_rfc3339()],
        )
        .map_err(db_err("insert user"))?;

        let id = UserId(conn.last_insert_rowid());
        info!(user = %id, "user created");
        Ok(id)
    }

    /// Issue a fresh bearer token for `user`.
    #[instrument(skip(self), fields(user = %user))]
    pub fn issue_session(&self, user: UserId) -> Result<String> {
        let token = Uuid::new_v4().simple().to_string();
        self.conn()
            .execute(
                "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token, user.0, Utc::now().to_rfc3339()],
            )
            .map_err(db_err("insert session"))?;

        debug!("session issued");
        Ok(token)
    }

    // -- Documents -----------------------------------------------------------

    /// Store an uploaded document. The bytes are immutable from here on.
    #[instrument(skip(self, bytes), fields(owner = %owner, size = bytes.len()))]
    pub fn upload_document(&self, owner: UserId, name: &str, bytes: &[u8]) -> Result<Document> {
        let meta_hash = hash_bytes(bytes);
        let created_at = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO documents (owner_id, name, sha256, size, created_at, bytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                owner.0,
                name,
                meta_hash,
                bytes.len() as i64,
                created_at.to_rfc3339(),
                bytes
            ],
        )
        .map_err(db_err("insert document"))?;

        let document = Document {
            id: DocumentId(conn.last_insert_rowid()),
            owner,
            name: name.to_owned(),
            sha256: meta_hash,
            size: bytes.len() as u64,
            created_at,
        };
        info!(document = %document.id, "document uploaded");
        Ok(document)
    }
}

impl Authenticator for SqliteStore {
    fn authenticate(&self, token: &str) -> Result<Option<UserId>> {
        self.conn()
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0).map(UserId),
            )
            .optional()
            .map_err(db_err("query session"))
    }
}

impl DocumentGateway for SqliteStore {
    #[instrument(skip(self), fields(document = %id))]
    fn load_document(&self, id: DocumentId) -> Result<Option<StoredDocument>> {
        self.conn()
            .query_row(
                "SELECT id, owner_id, name, sha256, size, created_at, bytes
                 FROM documents WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(StoredDocument {
                        meta: Document {
                            id: DocumentId(row.get(0)?),
                            owner: UserId(row.get(1)?),
                            name: row.get(2)?,
                            sha256: row.get(3)?,
                            size: row.get::<_, i64>(4)? as u64,
                            created_at: parse_timestamp(row, 5)?,
                        },
                        bytes: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(db_err("load document"))
    }

    #[instrument(skip_all, fields(document = %artifact.document_id, method = %artifact.method))]
    fn insert_artifact(&self, artifact: NewArtifact) -> Result<Artifact> {
        let meta = Artifact {
            id: 0,
            document_id: artifact.document_id,
            owner: artifact.owner,
            method: artifact.method,
            intended_for: artifact.intended_for,
            key_fingerprint: artifact.key_fingerprint,
            sha256: hash_bytes(&artifact.bytes),
            link_token: Uuid::new_v4().simple().to_string(),
            created_at: Utc::now(),
        };

        let conn = self.conn();
        conn.execute(
            "INSERT INTO versions (document_id, owner_id, method, intended_for,
                                   key_fingerprint, sha256, link_token, created_at, bytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                meta.document_id.0,
                meta.owner.0,
                meta.method,
                meta.intended_for,
                meta.key_fingerprint,
                meta.sha256,
                meta.link_token,
                meta.created_at.to_rfc3339(),
                artifact.bytes,
            ],
        )
        .map_err(db_err("insert version"))?;

        let meta = Artifact {
            id: conn.last_insert_rowid(),
            ..meta
        };
        info!(version = meta.id, "watermarked version stored");
        Ok(meta)
    }

    fn latest_artifact(
        &self,
        document: DocumentId,
        preferred_method: Option<&str>,
    ) -> Result<Option<StoredArtifact>> {
        // `method = NULL` is NULL for every row, so without a preference the
        // first sort key is a no-op and the newest row wins.
        let sql = format!(
            "SELECT {ARTIFACT_COLUMNS}, bytes FROM versions
             WHERE document_id = ?1
             ORDER BY (method = ?2) DESC, id DESC
             LIMIT 1"
        );
        self.conn()
            .query_row(&sql, params![document.0, preferred_method], row_to_stored_artifact)
            .optional()
            .map_err(db_err("latest version"))
    }

    fn list_artifacts(&self, document: DocumentId) -> Result<Vec<Artifact>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ARTIFACT_COLUMNS} FROM versions WHERE document_id = ?1 ORDER BY id DESC"
            ))
            .map_err(db_err("prepare list versions"))?;

        let artifacts = stmt
            .query_map(params![document.0], row_to_artifact)
            .map_err(db_err("query list versions"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("collect versions"))?;

        debug!(count = artifacts.len(), "listed versions");
        Ok(artifacts)
    }

    fn artifact_by_link(&self, link_token: &str) -> Result<Option<StoredArtifact>> {
        self.conn()
            .query_row(
                &format!("SELECT {ARTIFACT_COLUMNS}, bytes FROM versions WHERE link_token = ?1"),
                params![link_token],
                row_to_stored_artifact,
            )
            .optional()
            .map_err(db_err("version by link"))
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Column order must match `ARTIFACT_COLUMNS`.
fn row_to_artifact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Artifact> {
    Ok(Artifact {
        id: row.get(0)?,
        document_id: DocumentId(row.get(1)?),
        owner: UserId(row.get(2)?),
        method: row.get(3)?,
        intended_for: row.get(4)?,
        key_fingerprint: row.get(5)?,
        sha256: row.get(6)?,
        link_token: row.get(7)?,
        created_at: parse_timestamp(row, 8)?,
    })
}

fn row_to_stored_artifact(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredArtifact> {
    Ok(StoredArtifact {
        meta: row_to_artifact(row)?,
        bytes: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_document() -> (SqliteStore, UserId, Document) {
        let store = SqliteStore::open_in_memory().expect("open in-memory db");
        let owner = store.create_user("alice").expect("create user");
        let doc = store
            .upload_document(owner, "test.pdf", b"%PDF-1.4\n%%EOF\n")
            .expect("upload");
        (store, owner, doc)
    }

    fn new_artifact(doc: &Document, method: &str, bytes: &[u8]) -> NewArtifact {
        NewArtifact {
            document_id: doc.id,
            owner: doc.owner,
            method: method.into(),
            intended_for: "bob@example.com".into(),
            key_fingerprint: "f00d".into(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn upload_and_load_document() {
        let (store, owner, doc) = store_with_document();
        let loaded = store.load_document(doc.id).unwrap().expect("found");
        assert_eq!(loaded.meta, doc);
        assert_eq!(loaded.meta.owner, owner);
        assert_eq!(loaded.bytes, b"%PDF-1.4\n%%EOF\n");
        assert_eq!(loaded.meta.sha256, hash_bytes(&loaded.bytes));
    }

    #[test]
    fn load_missing_document_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_document(DocumentId(99_999)).unwrap().is_none());
    }

    #[test]
    fn sessions_authenticate_their_user() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alice = store.create_user("alice").unwrap();
        let bob = store.create_user("bob").unwrap();
        let token = store.issue_session(bob).unwrap();

        assert_eq!(store.authenticate(&token).unwrap(), Some(bob));
        assert_ne!(store.authenticate(&token).unwrap(), Some(alice));
        assert_eq!(store.authenticate("bogus").unwrap(), None);
    }

    #[test]
    fn duplicate_login_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_user("alice").unwrap();
        assert!(matches!(
            store.create_user("alice"),
            Err(FiligreeError::Database(_))
        ));
    }

    #[test]
    fn latest_artifact_prefers_method_then_recency() {
        let (store, _, doc) = store_with_document();
        assert!(store.latest_artifact(doc.id, None).unwrap().is_none());

        let a = store.insert_artifact(new_artifact(&doc, "trailer-seal", b"one")).unwrap();
        let b = store.insert_artifact(new_artifact(&doc, "object-stream", b"two")).unwrap();

        let newest = store.latest_artifact(doc.id, None).unwrap().unwrap();
        assert_eq!(newest.meta.id, b.id);
        assert_eq!(newest.bytes, b"two");

        let preferred = store
            .latest_artifact(doc.id, Some("trailer-seal"))
            .unwrap()
            .unwrap();
        assert_eq!(preferred.meta.id, a.id);

        let fallback = store.latest_artifact(doc.id, Some("unused")).unwrap().unwrap();
        assert_eq!(fallback.meta.id, b.id);
    }

    #[test]
    fn list_and_fetch_by_link() {
        let (store, _, doc) = store_with_document();
        let first = store.insert_artifact(new_artifact(&doc, "test-success", b"v1")).unwrap();
        let second = store.insert_artifact(new_artifact(&doc, "test-success", b"v2")).unwrap();
        assert_ne!(first.link_token, second.link_token);
        assert_eq!(first.sha256, hash_bytes(b"v1"));

        let listed = store.list_artifacts(doc.id).unwrap();
        assert_eq!(listed, vec![second.clone(), first.clone()]);

        let fetched = store.artifact_by_link(&first.link_token).unwrap().unwrap();
        assert_eq!(fetched.meta, first);
        assert_eq!(fetched.bytes, b"v1");
        assert!(store.artifact_by_link("nope").unwrap().is_none());
    }

    #[test]
    fn on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("filigree.db");

        let doc_id = {
            let store = SqliteStore::open(&path).unwrap();
            let owner = store.create_user("carol").unwrap();
            store.upload_document(owner, "a.pdf", b"%PDF-1.7").unwrap().id
        };

        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.load_document(doc_id).unwrap().is_some());
    }
}
