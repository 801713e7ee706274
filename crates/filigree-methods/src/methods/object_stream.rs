// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `object-stream` stores the sealed secret in its own stream object.
//
// The stream (`/Type /FiligreeMark`) is referenced from a `/FiligreeMarks`
// array, either on the catalog or, when a position names a page, on that
// page's dictionary. Viewers ignore unknown keys, so the rendered document
// is unchanged. The document is re-serialised by `lopdf`.

use filigree_core::error::MethodError;
use filigree_security::sealing;
use lopdf::{Dictionary, Object, ObjectId, Stream};
use tracing::{debug, instrument};

use crate::method::WatermarkingMethod;
use crate::pdf::{PdfInspector, has_pdf_header};

const MARKS_KEY: &[u8] = b"FiligreeMarks";

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectStream;

/// Parse a position as a 1-indexed page number.
fn page_number(position: &str) -> Option<u32> {
    position.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

fn failed(err: impl std::fmt::Display) -> MethodError {
    MethodError::Failed(err.to_string())
}

fn push_mark(dict: &mut Dictionary, mark: ObjectId) {
    match dict.get_mut(MARKS_KEY) {
        Ok(Object::Array(marks)) => marks.push(Object::Reference(mark)),
        _ => dict.set(MARKS_KEY, Object::Array(vec![Object::Reference(mark)])),
    }
}

/// Every mark referenced from the catalog or a page, newest object first.
fn mark_ids(inspector: &PdfInspector) -> Vec<ObjectId> {
    let doc = inspector.document();
    let mut holders: Vec<&Dictionary> = Vec::new();
    if let Ok(catalog) = doc.catalog() {
        holders.push(catalog);
    }
    for page_id in doc.get_pages().values() {
        if let Ok(page) = doc.get_dictionary(*page_id) {
            holders.push(page);
        }
    }

    let mut ids: Vec<ObjectId> = holders
        .into_iter()
        .filter_map(|dict| dict.get(MARKS_KEY).ok())
        .filter_map(|marks| marks.as_array().ok())
        .flatten()
        .filter_map(|mark| mark.as_reference().ok())
        .collect();
    ids.sort_unstable_by(|a, b| b.cmp(a));
    ids.dedup();
    ids
}

impl WatermarkingMethod for ObjectStream {
    fn name(&self) -> &str {
        "object-stream"
    }

    fn usage(&self) -> &str {
        "Stores the sealed secret in a dedicated stream object referenced from the \
         catalog, or from the page given as position (1-indexed)."
    }

    fn is_watermark_applicable(&self, pdf: &[u8], position: Option<&str>) -> bool {
        if !has_pdf_header(pdf) {
            return false;
        }
        let Ok(inspector) = PdfInspector::from_bytes(pdf) else {
            return false;
        };
        if inspector.page_count() == 0 {
            return false;
        }
        match position {
            None => true,
            Some(position) => page_number(position)
                .and_then(|n| inspector.page_id(n))
                .is_some(),
        }
    }

    #[instrument(skip_all, fields(position = ?position))]
    fn add_watermark(
        &self,
        pdf: &[u8],
        secret: &str,
        key: &str,
        position: Option<&str>,
    ) -> Result<Vec<u8>, MethodError> {
        let mut inspector = PdfInspector::from_bytes(pdf).map_err(failed)?;

        let holder_id = match position {
            None => inspector.catalog_id().map_err(failed)?,
            Some(position) => page_number(position)
                .and_then(|n| inspector.page_id(n))
                .ok_or_else(|| failed(format!("no page at position {position:?}")))?,
        };

        let sealed = sealing::seal(secret.as_bytes(), key).map_err(failed)?;
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"FiligreeMark".to_vec()));

        let doc = inspector.document_mut();
        let mark_id = doc.add_object(Object::Stream(Stream::new(dict, sealed)));
        match doc.get_object_mut(holder_id) {
            Ok(Object::Dictionary(holder)) => push_mark(holder, mark_id),
            _ => return Err(failed("mark holder is not a dictionary")),
        }

        debug!(?mark_id, ?holder_id, "mark stream added");
        inspector.to_bytes().map_err(failed)
    }

    fn read_secret(&self, pdf: &[u8], key: &str) -> Result<String, MethodError> {
        // Versions made by other methods may not be PDFs at all; that is a
        // miss, not a failure.
        let inspector = PdfInspector::from_bytes(pdf).map_err(|e| {
            MethodError::NotFound(format!("document has no readable PDF structure: {e}"))
        })?;
        let doc = inspector.document();

        for mark_id in mark_ids(&inspector) {
            let Ok(Object::Stream(stream)) = doc.get_object(mark_id) else {
                continue;
            };
            if let Some(plaintext) = sealing::open(&stream.content, key) {
                return String::from_utf8(plaintext)
                    .map_err(|e| failed(format!("sealed secret is not UTF-8: {e}")));
            }
        }

        Err(MethodError::NotFound(
            "no mark stream opens under this key".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::blank_pdf;

    #[test]
    fn applicability() {
        let pdf = blank_pdf(2).unwrap();
        assert!(ObjectStream.is_watermark_applicable(&pdf, None));
        assert!(ObjectStream.is_watermark_applicable(&pdf, Some("2")));
        assert!(!ObjectStream.is_watermark_applicable(&pdf, Some("3")));
        assert!(!ObjectStream.is_watermark_applicable(&pdf, Some("0")));
        assert!(!ObjectStream.is_watermark_applicable(&pdf, Some("top-left")));
        assert!(!ObjectStream.is_watermark_applicable(b"not a pdf", None));
    }

    #[test]
    fn round_trip_on_catalog() {
        let pdf = blank_pdf(1).unwrap();
        let marked = ObjectStream.add_watermark(&pdf, "my-secret", "my-key", None).unwrap();
        assert_eq!(ObjectStream.read_secret(&marked, "my-key").unwrap(), "my-secret");
        assert_eq!(PdfInspector::from_bytes(&marked).unwrap().page_count(), 1);
    }

    #[test]
    fn round_trip_on_page() {
        let pdf = blank_pdf(3).unwrap();
        let marked = ObjectStream.add_watermark(&pdf, "page-two", "k", Some("2")).unwrap();
        assert_eq!(ObjectStream.read_secret(&marked, "k").unwrap(), "page-two");
    }

    #[test]
    fn wrong_key_is_not_found() {
        let pdf = blank_pdf(1).unwrap();
        let marked = ObjectStream.add_watermark(&pdf, "s", "k1", None).unwrap();
        assert!(matches!(
            ObjectStream.read_secret(&marked, "k2"),
            Err(MethodError::NotFound(_))
        ));
    }

    #[test]
    fn layered_marks_each_open_with_their_key() {
        let pdf = blank_pdf(1).unwrap();
        let first = ObjectStream.add_watermark(&pdf, "one", "a", None).unwrap();
        let second = ObjectStream.add_watermark(&first, "two", "b", Some("1")).unwrap();
        assert_eq!(ObjectStream.read_secret(&second, "a").unwrap(), "one");
        assert_eq!(ObjectStream.read_secret(&second, "b").unwrap(), "two");
    }

    #[test]
    fn read_from_unreadable_bytes_is_not_found() {
        let candidates: [&[u8]; 2] = [b"junk", b"just some text\n%%TEST_WM:73\n"];
        for bytes in candidates {
            assert!(matches!(
                ObjectStream.read_secret(bytes, "k"),
                Err(MethodError::NotFound(_))
            ));
        }
    }

    #[test]
    fn multi_line_and_non_ascii_secrets_round_trip() {
        let pdf = blank_pdf(1).unwrap();
        for secret in ["line1\nline2\r\n", "Grüße, 世界 🔏", "\n"] {
            let marked = ObjectStream.add_watermark(&pdf, secret, "k", None).unwrap();
            assert_eq!(ObjectStream.read_secret(&marked, "k").unwrap(), secret);
        }
    }
}
