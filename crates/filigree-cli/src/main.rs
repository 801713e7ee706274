// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filigree — PDF watermarking from the command line.
//
// Entry point. Initialises logging, resolves the data directory, opens the
// store, and runs one subcommand.

mod app;
mod data_dir;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use app::{App, Command};

#[derive(Parser, Debug)]
#[command(name = "filigree", version)]
#[command(about = "Embed and recover secrets in PDF documents")]
struct Cli {
    /// Directory holding the database, audit log, and config.json
    #[arg(long, global = true, env = "FILIGREE_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let dir = match data_dir::data_dir(cli.data_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!(error = %e, "cannot create data directory");
            return ExitCode::FAILURE;
        }
    };

    let app = match App::open(&dir) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, path = %dir.display(), "failed to open store");
            return ExitCode::FAILURE;
        }
    };

    let reply = app.run(cli.command).await;
    match serde_json::to_string_pretty(&reply.body) {
        Ok(text) => println!("{text}"),
        Err(e) => tracing::error!(error = %e, "failed to render response"),
    }

    if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        tracing::debug!(status = reply.status, "command did not succeed");
        ExitCode::FAILURE
    }
}
