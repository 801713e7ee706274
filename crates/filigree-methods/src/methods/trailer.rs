// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `trailer-seal` appends a sealed secret after the final %%EOF.
//
// PDF readers stop at the last cross-reference section, so bytes after
// %%EOF are ignored when rendering. Each watermark is one comment line:
//
//   %%FILIGREE-SEAL:<hex(sealed secret)>
//
// Repeated watermarking appends further lines; reading tries them from the
// newest backwards and returns the first one that opens under the key.

use filigree_core::error::MethodError;
use filigree_security::sealing;
use tracing::debug;

use crate::method::WatermarkingMethod;
use crate::pdf::{find_all, has_eof_marker, has_pdf_header};

const SEAL_MARKER: &[u8] = b"%%FILIGREE-SEAL:";

#[derive(Debug, Clone, Copy, Default)]
pub struct TrailerSeal;

impl WatermarkingMethod for TrailerSeal {
    fn name(&self) -> &str {
        "trailer-seal"
    }

    fn usage(&self) -> &str {
        "Appends the secret, sealed with ChaCha20-Poly1305 under a key derived from the \
         watermark key, as a comment after %%EOF. Position is ignored."
    }

    fn is_watermark_applicable(&self, pdf: &[u8], _position: Option<&str>) -> bool {
        has_pdf_header(pdf) && has_eof_marker(pdf)
    }

    fn add_watermark(
        &self,
        pdf: &[u8],
        secret: &str,
        key: &str,
        _position: Option<&str>,
    ) -> Result<Vec<u8>, MethodError> {
        let sealed = sealing::seal(secret.as_bytes(), key)
            .map_err(|e| MethodError::Failed(e.to_string()))?;
        let encoded = hex::encode(sealed);

        let mut out = Vec::with_capacity(pdf.len() + SEAL_MARKER.len() + encoded.len() + 2);
        out.extend_from_slice(pdf);
        if !out.ends_with(b"\n") {
            out.push(b'\n');
        }
        out.extend_from_slice(SEAL_MARKER);
        out.extend_from_slice(encoded.as_bytes());
        out.push(b'\n');
        Ok(out)
    }

    fn read_secret(&self, pdf: &[u8], key: &str) -> Result<String, MethodError> {
        let markers = find_all(pdf, SEAL_MARKER);
        debug!(candidates = markers.len(), "scanning trailer seals");

        for start in markers.into_iter().rev() {
            let payload = &pdf[start + SEAL_MARKER.len()..];
            let end = payload
                .iter()
                .position(|&b| b == b'\n' || b == b'\r')
                .unwrap_or(payload.len());

            let Ok(sealed) = hex::decode(&payload[..end]) else {
                continue;
            };
            if let Some(plaintext) = sealing::open(&sealed, key) {
                return String::from_utf8(plaintext)
                    .map_err(|e| MethodError::Failed(format!("sealed secret is not UTF-8: {e}")));
            }
        }

        Err(MethodError::NotFound(
            "no trailer seal opens under this key".into(),
        ))
    }
}
