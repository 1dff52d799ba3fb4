use std::path::Path;

use mupdf::{Document, TextPageFlags};

use certlist_core::{BackendError, PageSource, PageText};

/// MuPDF-based implementation of [`PageSource`].
///
/// This crate is the sole AGPL island. It isolates the mupdf dependency
/// (which is AGPL-3.0) so that non-PDF code paths do not transitively
/// depend on it.
///
/// MuPDF reports each table cell as its own text line. Lines sharing a
/// baseline are stitched back into one row, and horizontal gaps wider than a
/// few characters become runs of spaces, so the output reads like
/// `pdftotext -layout`: columns separated by two or more spaces, words by one.
pub struct MupdfSource {
    /// Gap between two characters, in multiples of the font size, above which
    /// the gap is treated as a column break.
    column_gap: f32,
    /// Maximum baseline difference, in multiples of line height, for two
    /// lines to belong to the same row.
    baseline_tolerance: f32,
}

impl Default for MupdfSource {
    fn default() -> Self {
        Self {
            column_gap: 1.5,
            baseline_tolerance: 0.5,
        }
    }
}

impl MupdfSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column-break gap factor. Values `<= 0` keep the default.
    pub fn with_column_gap(mut self, factor: f32) -> Self {
        if factor > 0.0 {
            self.column_gap = factor;
        }
        self
    }

    /// Set the same-row baseline tolerance. Values `<= 0` keep the default.
    pub fn with_baseline_tolerance(mut self, factor: f32) -> Self {
        if factor > 0.0 {
            self.baseline_tolerance = factor;
        }
        self
    }
}

/// A run of text MuPDF placed on one line, with its horizontal extent.
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    x0: f32,
    x1: f32,
    baseline: f32,
    height: f32,
    text: String,
}

impl PageSource for MupdfSource {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, BackendError> {
        if !path.exists() {
            return Err(BackendError::NotFound(path.display().to_string()));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let mut segments = Vec::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let bounds = line.bounds();
                    let chars: Vec<(char, f32, f32)> = line
                        .chars()
                        .map(|c| (c.char().unwrap_or('\u{FFFD}'), c.origin().x, c.size()))
                        .collect();
                    let Some(&(_, _, size)) = chars.first() else {
                        continue;
                    };
                    segments.push(Segment {
                        x0: bounds.x0,
                        x1: bounds.x1,
                        baseline: bounds.y1,
                        height: (bounds.y1 - bounds.y0).max(size),
                        text: pad_inner_gaps(&chars, self.column_gap),
                    });
                }
            }

            let lines = layout_rows(segments, self.baseline_tolerance);
            tracing::debug!(page = pages.len() + 1, lines = lines.len(), "page text extracted");
            pages.push(PageText::from_lines(lines));
        }

        Ok(pages)
    }
}

/// Rebuild a line's text, turning wide gaps between characters into a
/// two-space column break.
fn pad_inner_gaps(chars: &[(char, f32, f32)], column_gap: f32) -> String {
    let mut text = String::with_capacity(chars.len());
    let mut prev_x: Option<f32> = None;
    for &(ch, x, size) in chars {
        if let Some(px) = prev_x
            && x - px > size * column_gap
            && !text.ends_with("  ")
        {
            text.push_str("  ");
        }
        text.push(ch);
        prev_x = Some(x);
    }
    text
}

/// Group segments sharing a baseline into rows, left to right, top to bottom.
fn layout_rows(mut segments: Vec<Segment>, tolerance: f32) -> Vec<String> {
    segments.sort_by(|a, b| a.baseline.total_cmp(&b.baseline).then(a.x0.total_cmp(&b.x0)));

    let mut rows: Vec<Vec<Segment>> = Vec::new();
    for seg in segments {
        match rows.last_mut() {
            Some(row)
                if (seg.baseline - row[0].baseline).abs() <= row[0].height * tolerance =>
            {
                row.push(seg)
            }
            _ => rows.push(vec![seg]),
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            let mut line = String::new();
            let mut prev_x1: Option<f32> = None;
            for seg in &row {
                if let Some(px1) = prev_x1 {
                    // One space per half line-height of gap, never fewer than
                    // two so the gap always reads as a column break.
                    let unit = (seg.height / 2.0).max(1.0);
                    let spaces = (((seg.x0 - px1) / unit).round() as usize).max(2);
                    line.push_str(&" ".repeat(spaces));
                }
                line.push_str(seg.text.trim());
                prev_x1 = Some(seg.x1);
            }
            line
        })
        .collect()
}
