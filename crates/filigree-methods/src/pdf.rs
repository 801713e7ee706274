// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF helpers shared by the built-in methods: cheap byte-level checks and a
// thin `lopdf` wrapper.

use filigree_core::error::FiligreeError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};

const PDF_HEADER: &[u8] = b"%PDF-";
const EOF_MARKER: &[u8] = b"%%EOF";

/// Byte offsets of every occurrence of `needle` in `haystack`, ascending.
/// Overlapping matches are not reported.
pub fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut hits = Vec::new();
    if needle.is_empty() || haystack.len() < needle.len() {
        return hits;
    }
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if &haystack[i..i + needle.len()] == needle {
            hits.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    hits
}

/// `%PDF-` header present.
pub fn has_pdf_header(data: &[u8]) -> bool {
    data.starts_with(PDF_HEADER)
}

/// At least one `%%EOF` marker present.
pub fn has_eof_marker(data: &[u8]) -> bool {
    !find_all(data, EOF_MARKER).is_empty()
}

/// Parsed view of a PDF, used by structure-aware methods.
pub struct PdfInspector {
    document: Document,
}

impl PdfInspector {
    /// Parse raw PDF bytes.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, FiligreeError> {
        if !has_pdf_header(data) {
            return Err(FiligreeError::PdfError("missing %PDF- header".into()));
        }
        let document = Document::load_mem(data)
            .map_err(|err| FiligreeError::PdfError(format!("failed to load PDF: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF parsed");
        Ok(Self { document })
    }

    /// Number of pages reachable from the page tree. Zero for documents
    /// whose page tree is missing or broken.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Object id of the 1-indexed page `number`.
    pub fn page_id(&self, number: u32) -> Option<ObjectId> {
        self.document.get_pages().get(&number).copied()
    }

    /// Object id of the document catalog.
    pub fn catalog_id(&self) -> Result<ObjectId, FiligreeError> {
        self.document
            .trailer
            .get(b"Root")
            .and_then(|root| root.as_reference())
            .map_err(|err| FiligreeError::PdfError(format!("no /Root reference: {err}")))
    }

    /// The parsed `lopdf` document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access for methods that add objects. Changes only reach the
    /// output through [`Self::to_bytes`].
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Serialise the (possibly modified) document.
    pub fn to_bytes(mut self) -> Result<Vec<u8>, FiligreeError> {
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| FiligreeError::PdfError(format!("failed to serialise PDF: {err}")))?;
        Ok(output)
    }
}

/// Build a minimal, valid PDF with `pages` blank US-Letter pages.
pub fn blank_pdf(pages: u32) -> Result<Vec<u8>, FiligreeError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages as usize);
    for _ in 0..pages {
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut page_tree = Dictionary::new();
    page_tree.set("Type", Object::Name(b"Pages".to_vec()));
    page_tree.set("Kids", Object::Array(kids));
    page_tree.set("Count", Object::Integer(i64::from(pages)));
    doc.objects.insert(pages_id, Object::Dictionary(page_tree));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| FiligreeError::PdfError(format!("failed to serialise PDF: {err}")))?;
    Ok(output)
}
