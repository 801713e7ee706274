// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Concrete watermarking methods.

pub mod object_stream;
pub mod reference;
pub mod trailer;
