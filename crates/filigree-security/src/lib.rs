// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// filigree-security — Cryptographic helpers for watermarking.
//
// Fingerprints documents and keys, seals secrets under a caller-supplied key
// so key-sensitive methods can embed them, and keeps a tamper-evident audit
// trail of every watermark request.

pub mod audit;
pub mod integrity;
pub mod sealing;

pub use audit::{AuditEntry, AuditEvent, AuditLog};
pub use integrity::{hash_bytes, key_fingerprint, verify_hash};
pub use sealing::{open, seal};
