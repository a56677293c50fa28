#![allow(dead_code)]
//! Shared helpers for integration tests.
//!
//! `ScriptedBackend` reads a tiny text format instead of a real PDF, so tests
//! can describe exact run positions and backend behaviour:
//!
//! ```text
//! %PDF-1.7 scripted
//! page 612 792
//! run 50 100 280 110 Left column text
//! fail primary          (primary returns an extraction error)
//! empty primary         (primary returns one page without runs)
//! panic all             (both backends panic)
//! sleep 50              (every backend sleeps 50 ms first)
//! ```

use pdf_reflow::error::{Error, Result};
use pdf_reflow::extractors::{BackendKind, ExtractionBackend};
use pdf_reflow::geometry::BBox;
use pdf_reflow::layout::PageRuns;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Backend driven by a text script.
pub struct ScriptedBackend {
    name: &'static str,
    kind: BackendKind,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    /// A primary backend named "scripted-primary".
    pub fn primary() -> Arc<Self> {
        Arc::new(Self {
            name: "scripted-primary",
            kind: BackendKind::Primary,
            calls: AtomicUsize::new(0),
        })
    }

    /// A fallback backend named "scripted-fallback".
    pub fn fallback() -> Arc<Self> {
        Arc::new(Self {
            name: "scripted-fallback",
            kind: BackendKind::Fallback,
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of `extract` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn targeted(&self, who: Option<&str>) -> bool {
        match who {
            None | Some("all") => true,
            Some("primary") => self.kind == BackendKind::Primary,
            Some("fallback") => self.kind == BackendKind::Fallback,
            Some(_) => false,
        }
    }
}

impl ExtractionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageRuns>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = String::from_utf8_lossy(bytes);
        let mut pages: Vec<PageRuns> = Vec::new();

        for line in script.lines() {
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("fail") if self.targeted(parts.next()) => {
                    return Err(Error::extraction(self.name, "scripted failure"));
                },
                Some("empty") if self.targeted(parts.next()) => {
                    return Ok(vec![PageRuns::new(0, 612.0, 792.0)]);
                },
                Some("panic") if self.targeted(parts.next()) => {
                    panic!("scripted panic in {}", self.name);
                },
                Some("sleep") => {
                    let ms = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0);
                    std::thread::sleep(Duration::from_millis(ms));
                },
                Some("page") => {
                    let w = parts.next().and_then(|v| v.parse().ok()).unwrap_or(612.0);
                    let h = parts.next().and_then(|v| v.parse().ok()).unwrap_or(792.0);
                    pages.push(PageRuns::new(pages.len(), w, h));
                },
                Some("run") => {
                    let coords: Vec<f32> = parts.by_ref().take(4).filter_map(|v| v.parse().ok()).collect();
                    let text = parts.collect::<Vec<_>>().join(" ");
                    if let (4, Some(page)) = (coords.len(), pages.last_mut()) {
                        page.push(text, BBox::new(coords[0], coords[1], coords[2], coords[3]));
                    }
                },
                _ => {},
            }
        }

        Ok(pages)
    }
}

/// Builder for scripted documents.
#[derive(Debug, Clone)]
pub struct Script {
    body: String,
}

impl Script {
    /// Start a document with a PDF signature.
    pub fn new() -> Self {
        Self {
            body: "%PDF-1.7 scripted\n".to_string(),
        }
    }

    /// Add a raw directive line.
    pub fn directive(mut self, line: &str) -> Self {
        self.body.push_str(line);
        self.body.push('\n');
        self
    }

    /// Start a US Letter page.
    pub fn page(self) -> Self {
        self.directive("page 612 792")
    }

    /// Add a run to the current page.
    pub fn run(self, x0: f32, y0: f32, x1: f32, y1: f32, text: &str) -> Self {
        let line = format!("run {} {} {} {} {}", x0, y0, x1, y1, text);
        self.directive(&line)
    }

    /// Add a page with `rows` lines in each of two columns.
    ///
    /// Left lines read "`tag` left N", right lines "`tag` right N". Runs are
    /// emitted column by column, the way many PDFs store them.
    pub fn two_column_page(self, tag: &str, rows: usize) -> Self {
        let mut script = self.page();
        for r in 0..rows {
            let y = 120.0 + r as f32 * 14.0;
            script = script.run(50.0, y, 280.0, y + 10.0, &format!("{} left {}", tag, r));
        }
        for r in 0..rows {
            let y = 120.0 + r as f32 * 14.0;
            script = script.run(320.0, y, 550.0, y + 10.0, &format!("{} right {}", tag, r));
        }
        script
    }

    /// Script bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.body.clone().into_bytes()
    }
}

/// Lines of a converted text.
pub fn lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.is_empty()).collect()
}
