//! Fallback backend: line runs from `lopdf` page text.
//!
//! `lopdf` decodes each page's text operators but reports no positions, so
//! every extracted line becomes a run spanning the page width, with lines
//! spaced evenly down the page in extraction order. Column detection sees a
//! single column on such pages and the text keeps `lopdf`'s order.

use super::{BackendKind, ExtractionBackend, panic_message, sniff_pdf};
use crate::error::{Error, Result};
use crate::geometry::BBox;
use crate::layout::text_run::PageRuns;
use lopdf::{Document, Object, ObjectId};
use std::panic::{self, AssertUnwindSafe};

const NAME: &str = "lopdf";

/// US Letter, used when a page carries no MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Maximum depth followed through `/Parent` links when looking for an
/// inherited MediaBox.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Nominal height of one coarse line box, in points.
const LINE_HEIGHT: f32 = 12.0;

/// Line-level extraction through `lopdf`.
#[derive(Debug, Clone, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionBackend for LopdfBackend {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageRuns>> {
        sniff_pdf(bytes)?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| extract_document(bytes)));
        match outcome {
            Ok(result) => result,
            Err(payload) => Err(Error::extraction(NAME, panic_message(payload.as_ref()))),
        }
    }
}

fn extract_document(bytes: &[u8]) -> Result<Vec<PageRuns>> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::extraction(NAME, e))?;
    if doc.is_encrypted() {
        return Err(Error::extraction(NAME, "document is encrypted"));
    }

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(Error::extraction(NAME, "document has no pages"));
    }

    let mut result = Vec::with_capacity(pages.len());
    for (page_number, page_id) in pages {
        let (width, height) = page_size(&doc, page_id);
        let text = doc
            .extract_text(&[page_number])
            .map_err(|e| Error::extraction(NAME, format!("page {}: {}", page_number, e)))?;
        let index = page_number.saturating_sub(1) as usize;
        result.push(lay_out_lines(index, width, height, &text));
    }

    log::debug!(
        "{}: {} pages, {} line runs",
        NAME,
        result.len(),
        result.iter().map(|p| p.runs.len()).sum::<usize>()
    );
    Ok(result)
}

/// Give each non-blank line a full-width box, spaced evenly down the page.
pub fn lay_out_lines(page_index: usize, width: f32, height: f32, text: &str) -> PageRuns {
    let mut page = PageRuns::new(page_index, width, height);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return page;
    }

    let step = height / (lines.len() + 1) as f32;
    let half = LINE_HEIGHT.min(step) / 2.0;
    for (i, line) in lines.into_iter().enumerate() {
        let centre = step * (i + 1) as f32;
        page.push(line, BBox::new(0.0, centre - half, width, centre + half));
    }
    page
}

/// Page width and height from the MediaBox, following `/Parent` links.
fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let mut current = page_id;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let Ok(dict) = doc.get_dictionary(current) else {
            break;
        };
        if let Some(size) = dict.get(b"MediaBox").ok().and_then(|o| media_box_size(doc, o)) {
            return size;
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => break,
        }
    }
    DEFAULT_PAGE_SIZE
}

fn media_box_size(doc: &Document, obj: &Object) -> Option<(f32, f32)> {
    let obj = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values: Vec<f32> = obj.as_array().ok()?.iter().filter_map(get_number).collect();
    if values.len() != 4 {
        return None;
    }
    let width = (values[2] - values[0]).abs();
    let height = (values[3] - values[1]).abs();
    (width > 0.0 && height > 0.0).then_some((width, height))
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lay_out_lines_spacing() {
        let page = lay_out_lines(2, 600.0, 400.0, "first line\n\n  second line  \nthird line\n");
        assert_eq!(page.runs.len(), 3);
        assert_eq!(page.page_index, 2);
        assert_eq!(page.runs[1].text, "second line");
        assert_eq!(page.runs[0].bbox.mid_y(), 100.0);
        assert_eq!(page.runs[2].bbox.mid_y(), 300.0);
        assert_eq!(page.runs[0].bbox.width(), 600.0);
        assert!(page.runs.iter().all(|r| r.page_index == 2));
    }

    #[test]
    fn test_lay_out_lines_empty() {
        let page = lay_out_lines(0, 612.0, 792.0, " \n\n");
        assert!(page.runs.is_empty());
    }

    #[test]
    fn test_rejects_non_pdf() {
        assert!(matches!(LopdfBackend::new().extract(b"<html>"), Err(Error::UnsupportedInput(_))));
    }

    #[test]
    fn test_broken_pdf_is_extraction_failure() {
        let err = LopdfBackend::new().extract(b"%PDF-1.5\ngarbage").unwrap_err();
        assert!(matches!(err, Error::Extraction { ref backend, .. } if backend == "lopdf"));
    }
}
