//! Primary backend: word runs from `pdf-extract` glyph callbacks.
//!
//! `pdf-extract` drives an [`OutputDev`] with one call per glyph, passing the
//! text rendering matrix. [`WordCollector`] turns those calls into
//! word-granularity [`PositionedRun`](crate::layout::PositionedRun)s:
//!
//! ```text
//! split before a glyph when
//!     it is whitespace
//!     or |baseline - word.baseline| > 0.5 * font_size      (new line)
//!     or x < word.x1 - 0.5 * font_size                     (moved left)
//!     or x - word.x1 > word_margin * max(width, font_size) (gap)
//! ```
//!
//! PDF user space has its origin at the bottom-left; runs are flipped to
//! the top-left origin using the page MediaBox.

use super::{BackendKind, ExtractionBackend, panic_message, sniff_pdf};
use crate::error::{Error, Result};
use crate::geometry::BBox;
use crate::layout::text_run::PageRuns;
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use std::panic::{self, AssertUnwindSafe};

const NAME: &str = "pdf-extract";

/// Word-level extraction through `pdf-extract`.
#[derive(Debug, Clone)]
pub struct PdfExtractBackend {
    word_margin: f32,
}

impl PdfExtractBackend {
    /// Create a backend with the default word margin (0.1 of the glyph size).
    pub fn new() -> Self {
        Self { word_margin: 0.1 }
    }

    /// Set the horizontal gap, relative to glyph size, that splits words.
    pub fn with_word_margin(mut self, word_margin: f32) -> Self {
        self.word_margin = word_margin;
        self
    }
}

impl Default for PdfExtractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionBackend for PdfExtractBackend {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Primary
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageRuns>> {
        sniff_pdf(bytes)?;

        let doc = pdf_extract::Document::load_mem(bytes).map_err(|e| Error::extraction(NAME, e))?;
        if doc.is_encrypted() {
            return Err(Error::extraction(NAME, "document is encrypted"));
        }
        if doc.get_pages().is_empty() {
            return Err(Error::extraction(NAME, "document has no pages"));
        }

        let mut collector = WordCollector::new(self.word_margin);
        // pdf-extract panics on some malformed inputs (missing MediaBox, bad fonts)
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::output_doc(&doc, &mut collector)
        }));

        match outcome {
            Ok(Ok(())) => {
                let pages = collector.finish();
                log::debug!(
                    "{}: {} pages, {} runs",
                    NAME,
                    pages.len(),
                    pages.iter().map(|p| p.runs.len()).sum::<usize>()
                );
                Ok(pages)
            },
            Ok(Err(e)) => Err(Error::extraction(NAME, e)),
            Err(payload) => Err(Error::extraction(NAME, panic_message(payload.as_ref()))),
        }
    }
}

#[derive(Debug)]
struct WordBuf {
    text: String,
    bbox: BBox,
    baseline: f32,
}

/// [`OutputDev`] that groups glyphs into word runs, page by page.
#[derive(Debug)]
pub struct WordCollector {
    word_margin: f32,
    pages: Vec<PageRuns>,
    page: Option<PageRuns>,
    origin_x: f32,
    top_y: f32,
    word: Option<WordBuf>,
}

impl WordCollector {
    /// Create an empty collector.
    pub fn new(word_margin: f32) -> Self {
        Self {
            word_margin,
            pages: Vec::new(),
            page: None,
            origin_x: 0.0,
            top_y: 0.0,
            word: None,
        }
    }

    /// Start a page of the given size. `page_number` is 1-based.
    pub fn start_page(&mut self, page_number: u32, media_box: &MediaBox) {
        self.close_page();
        let width = (media_box.urx - media_box.llx).abs() as f32;
        let height = (media_box.ury - media_box.lly).abs() as f32;
        self.origin_x = media_box.llx.min(media_box.urx) as f32;
        self.top_y = media_box.ury.max(media_box.lly) as f32;
        let index = page_number.saturating_sub(1) as usize;
        self.page = Some(PageRuns::new(index, width, height));
    }

    /// Feed one glyph in PDF user space.
    ///
    /// `x` and `baseline_y` are the glyph origin, `advance` its width and
    /// `size` the rendered font size, all in points.
    pub fn push_glyph(&mut self, text: &str, x: f32, baseline_y: f32, advance: f32, size: f32) {
        if self.page.is_none() || text.is_empty() {
            return;
        }
        if text.chars().all(char::is_whitespace) {
            self.flush_word();
            return;
        }

        let x0 = x - self.origin_x;
        let baseline = self.top_y - baseline_y;
        let advance = if advance.is_finite() { advance.max(0.0) } else { 0.0 };
        let glyph = BBox::new(x0, baseline - size, x0 + advance, baseline);

        let breaks = match &self.word {
            Some(word) => {
                let new_line = (baseline - word.baseline).abs() > 0.5 * size;
                let moved_left = x0 < word.bbox.x1 - 0.5 * size;
                let gap = x0 - word.bbox.x1 > self.word_margin * advance.max(size);
                new_line || moved_left || gap
            },
            None => false,
        };
        if breaks {
            self.flush_word();
        }

        match self.word.as_mut() {
            Some(word) => {
                word.text.push_str(text);
                word.bbox = word.bbox.union(&glyph);
            },
            None => {
                self.word = Some(WordBuf {
                    text: text.to_string(),
                    bbox: glyph,
                    baseline,
                });
            },
        }
    }

    /// Close the current word, if any.
    pub fn flush_word(&mut self) {
        if let (Some(word), Some(page)) = (self.word.take(), self.page.as_mut()) {
            page.push(word.text, word.bbox);
        }
    }

    fn close_page(&mut self) {
        self.flush_word();
        if let Some(page) = self.page.take() {
            self.pages.push(page);
        }
    }

    /// Finish collection and return pages in order.
    pub fn finish(mut self) -> Vec<PageRuns> {
        self.close_page();
        self.pages.sort_by_key(|p| p.page_index);
        self.pages
    }
}

impl OutputDev for WordCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.start_page(page_num, media_box);
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.close_page();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        // Rendered size: the font size vector pushed through the matrix
        let vx = font_size * (trm.m11 + trm.m21);
        let vy = font_size * (trm.m12 + trm.m22);
        let mut size = (vx * vy).abs().sqrt();
        if !size.is_finite() || size <= 0.0 {
            size = font_size.abs();
        }
        self.push_glyph(
            char,
            trm.m31 as f32,
            trm.m32 as f32,
            (width * size) as f32,
            size as f32,
        );
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}
