// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommands and the services they run against.
//
// Every command produces a `Reply`; `main` prints its body and maps the
// status onto the exit code.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;
use filigree_core::AppConfig;
use filigree_core::error::{FiligreeError, Result};
use filigree_core::outcome::Outcome;
use filigree_methods::MethodRegistry;
use filigree_security::audit::AuditLog;
use filigree_store::{Authenticator, SqliteStore};
use filigree_workflow::reply::{STATUS_CREATED, STATUS_OK};
use filigree_workflow::{Reply, WatermarkService};
use serde_json::{Value, json};
use tracing::info;

const AUDIT_FILE: &str = "audit.db";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the registered watermarking methods
    Methods,

    /// Create a user and print a session token for it
    User {
        login: String,
    },

    /// Upload a document
    Upload {
        #[arg(long, env = "FILIGREE_TOKEN")]
        token: String,
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Watermark a document
    Create {
        #[arg(long, env = "FILIGREE_TOKEN")]
        token: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        method: String,
        #[arg(long)]
        intended_for: String,
        #[arg(long)]
        secret: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        position: Option<String>,
    },

    /// Recover the secret from the latest watermarked version of a document
    Read {
        #[arg(long, env = "FILIGREE_TOKEN")]
        token: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        method: String,
        #[arg(long)]
        key: String,
    },

    /// List the watermarked versions of a document
    Versions {
        #[arg(long, env = "FILIGREE_TOKEN")]
        token: String,
        #[arg(long)]
        id: String,
    },

    /// Download a watermarked version by its access link
    Fetch {
        #[arg(long)]
        link: String,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

/// Store plus workflow engine, wired the same way for every command.
pub struct App {
    store: Arc<SqliteStore>,
    service: WatermarkService,
}

impl App {
    /// Open the database and audit log in `data_dir`, writing a default
    /// `config.json` on first run.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = match AppConfig::load(data_dir) {
            Some(config) => config,
            None => {
                let config = AppConfig::default();
                config.persist(data_dir)?;
                info!(path = %data_dir.display(), "default configuration written");
                config
            }
        };

        let store = Arc::new(SqliteStore::open(data_dir.join(&config.database_file))?);
        let audit = AuditLog::open(data_dir.join(AUDIT_FILE))?;
        Ok(Self::assemble(store, config).with_audit(audit))
    }

    fn assemble(store: Arc<SqliteStore>, config: AppConfig) -> Self {
        let registry = Arc::new(MethodRegistry::with_builtin_methods());
        let service = WatermarkService::new(registry, store.clone(), store.clone(), config);
        Self { store, service }
    }

    fn with_audit(self, audit: AuditLog) -> Self {
        Self {
            service: self.service.with_audit_log(audit),
            ..self
        }
    }

    /// Execute one subcommand.
    pub async fn run(&self, command: Command) -> Reply {
        match command {
            Command::Methods => Reply::success(STATUS_OK, &self.service.list_methods()),

            Command::User { login } => Reply::from_result(self.create_user(&login), STATUS_CREATED),

            Command::Upload { token, file } => {
                Reply::from_result(self.upload(&token, &file), STATUS_CREATED)
            }

            Command::Create { token, id, method, intended_for, secret, key, position } => {
                let body = json!({
                    "method": method,
                    "intended_for": intended_for,
                    "secret": secret,
                    "key": key,
                    "position": position,
                });
                Reply::from_result(
                    self.service.create_watermark(Some(&token), Some(&id), &body).await,
                    STATUS_CREATED,
                )
            }

            Command::Read { token, id, method, key } => {
                let body = json!({ "method": method, "key": key });
                Reply::from_result(
                    self.service.read_watermark(Some(&token), Some(&id), &body).await,
                    STATUS_CREATED,
                )
            }

            Command::Versions { token, id } => Reply::from_result(
                self.service.list_versions(Some(&token), Some(&id)).await,
                STATUS_OK,
            ),

            Command::Fetch { link, out } => {
                Reply::from_result(self.fetch(&link, &out).await, STATUS_OK)
            }
        }
    }

    fn create_user(&self, login: &str) -> std::result::Result<Value, Outcome> {
        let user = self.store.create_user(login)?;
        let token = self.store.issue_session(user)?;
        Ok(json!({ "id": user, "login": login, "token": token }))
    }

    fn upload(&self, token: &str, file: &Path) -> std::result::Result<Value, Outcome> {
        let user = self
            .store
            .authenticate(token)?
            .ok_or(Outcome::Unauthenticated)?;
        let bytes = std::fs::read(file).map_err(|e| {
            FiligreeError::invalid(format!("cannot read {}: {e}", file.display()))
        })?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".into());

        let document = self.store.upload_document(user, &name, &bytes)?;
        Ok(json!({
            "id": document.id,
            "name": document.name,
            "size": document.size,
            "sha256": document.sha256,
        }))
    }

    async fn fetch(&self, link: &str, out: &Path) -> std::result::Result<Value, Outcome> {
        let bytes = self.service.get_version(link).await?;
        std::fs::write(out, &bytes).map_err(FiligreeError::Io)?;
        Ok(json!({ "written": out.display().to_string(), "size": bytes.len() }))
    }
}
