// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// filigree-store — The document/ownership gateway and session lookup the
// watermark workflow depends on, plus a SQLite implementation of both.

pub mod gateway;
pub mod sqlite;

pub use gateway::{Authenticator, DocumentGateway};
pub use sqlite::SqliteStore;
