// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit trail: append-only SQLite log of every watermark request that got
// past authentication.
//
// Schema:
//   watermark_audit(
//     id            INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp     TEXT    NOT NULL,   -- RFC 3339
//     action        TEXT    NOT NULL,   -- "create-watermark", "read-watermark", ...
//     user_id       INTEGER NOT NULL,
//     document_id   INTEGER,            -- NULL when the id did not parse
//     method        TEXT,               -- NULL when the payload had none
//     outcome       TEXT    NOT NULL,   -- "success" or an outcome label
//     document_hash TEXT                -- SHA-256 of the source document
//   )
//
// Secrets and keys are never written here.

use std::path::Path;

use chrono::Utc;
use filigree_core::error::FiligreeError;
use filigree_core::types::{DocumentId, UserId};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS watermark_audit (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp     TEXT    NOT NULL,
        action        TEXT    NOT NULL,
        user_id       INTEGER NOT NULL,
        document_id   INTEGER,
        method        TEXT,
        outcome       TEXT    NOT NULL,
        document_hash TEXT
    );
    CREATE INDEX IF NOT EXISTS watermark_audit_document
        ON watermark_audit (document_id);
";

fn db_err(e: rusqlite::Error) -> FiligreeError {
    FiligreeError::Database(e.to_string())
}

/// One request to be recorded.
#[derive(Debug, Clone, Copy)]
pub struct AuditEvent<'a> {
    pub action: &'a str,
    pub user: UserId,
    pub document: Option<DocumentId>,
    pub method: Option<&'a str>,
    pub outcome: &'a str,
    pub document_hash: Option<&'a str>,
}

/// A stored audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub user: UserId,
    pub document: Option<DocumentId>,
    pub method: Option<String>,
    pub outcome: String,
    pub document_hash: Option<String>,
}

/// Append-only audit log backed by SQLite.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `path` in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FiligreeError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("audit log opened");
        Ok(Self { conn })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self, FiligreeError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("in-memory audit log opened");
        Ok(Self { conn })
    }

    /// Append one entry, timestamped now. Entries are never updated or
    /// deleted.
    #[instrument(skip_all, fields(action = event.action, user = %event.user, outcome = event.outcome))]
    pub fn record(&self, event: &AuditEvent<'_>) -> Result<(), FiligreeError> {
        self.conn
            .execute(
                "INSERT INTO watermark_audit
                     (timestamp, action, user_id, document_id, method, outcome, document_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    Utc::now().to_rfc3339(),
                    event.action,
                    event.user.0,
                    event.document.map(|d| d.0),
                    event.method,
                    event.outcome,
                    event.document_hash,
                ],
            )
            .map_err(db_err)?;

        debug!("audit entry recorded");
        Ok(())
    }

    /// All entries touching `document`, oldest first.
    pub fn entries_for_document(
        &self,
        document: DocumentId,
    ) -> Result<Vec<AuditEntry>, FiligreeError> {
        self.query(
            "SELECT id, timestamp, action, user_id, document_id, method, outcome, document_hash
             FROM watermark_audit
             WHERE document_id = ?1
             ORDER BY id ASC",
            params![document.0],
        )
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>, FiligreeError> {
        self.query(
            "SELECT id, timestamp, action, user_id, document_id, method, outcome, document_hash
             FROM watermark_audit
             ORDER BY id DESC
             LIMIT ?1",
            params![limit],
        )
    }

    /// Total number of entries recorded so far.
    pub fn count(&self) -> Result<u64, FiligreeError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM watermark_audit", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn query(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<AuditEntry>, FiligreeError> {
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    action: row.get(2)?,
                    user: UserId(row.get(3)?),
                    document: row.get::<_, Option<i64>>(4)?.map(DocumentId),
                    method: row.get(5)?,
                    outcome: row.get(6)?,
                    document_hash: row.get(7)?,
                })
            })
            .map_err(db_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}
