// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// filigree-methods — Pluggable watermarking algorithms.
//
// Every algorithm implements `WatermarkingMethod`; a `MethodRegistry` maps
// method names to shared instances. Built-in methods operate on PDF bytes
// with `lopdf`; the reference methods have trivial, fully predictable
// behaviour and exist to exercise callers.

pub mod method;
pub mod methods;
pub mod pdf;
pub mod registry;

pub use method::WatermarkingMethod;
pub use methods::object_stream::ObjectStream;
pub use methods::reference::{FailingMethod, NotApplicableMethod, SucceedingMethod};
pub use methods::trailer::TrailerSeal;
pub use registry::MethodRegistry;
