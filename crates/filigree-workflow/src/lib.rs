// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// filigree-workflow — Orchestrates create-watermark and read-watermark
// requests: authentication, id and payload validation, ownership, method
// resolution, applicability, isolated embed/extract, and persistence.

mod isolation;
pub mod reply;
pub mod request;
pub mod service;

pub use reply::Reply;
pub use request::{CreatePayload, ReadPayload};
pub use service::{CreateResponse, ReadResponse, WatermarkService};
