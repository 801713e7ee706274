// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filigree — Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod outcome;
pub mod types;

pub use config::AppConfig;
pub use error::{FiligreeError, MethodError};
pub use outcome::Outcome;
pub use types::*;
