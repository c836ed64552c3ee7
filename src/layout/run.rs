//! Positioned text runs and page-level normalization.
//!
//! The external PDF decoder delivers one `PageContent` per page. Before any
//! layout work, run text is NFKC-normalized (statements mix non-breaking
//! spaces and composed accents, e.g. "IMPAYÉ") and pages are merged in
//! original page order.

use unicode_normalization::UnicodeNormalization;

/// A text run with position and style information, page-scoped and
/// immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Width of the text
    pub width: f32,
    /// Height of the text
    pub height: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl TextRun {
    /// Create a new text run.
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height: font_size,
            font_size,
            font_name: String::new(),
        }
    }

    /// Right edge of the run.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Horizontal center of the run.
    pub fn center(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// One page's worth of decoded content, as supplied by the external
/// collaborator.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// Decoded runs in arrival order.
    pub runs: Vec<TextRun>,
}

impl PageContent {
    /// Create a page with the given dimensions.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            runs: Vec::new(),
        }
    }

    /// Add a run to the page.
    pub fn push(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    /// Whether the page carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.runs.iter().any(|r| !r.text.trim().is_empty())
    }
}

/// Merge decoded pages into one run list, preserving page order.
///
/// Each page's y coordinates are offset so that page N sits below page N-1
/// (PDF y grows upward, so later pages get progressively lower y values).
/// Run text is NFKC-normalized and non-breaking spaces become plain spaces;
/// empty runs are dropped.
pub fn merge_pages(pages: &[PageContent]) -> Vec<TextRun> {
    let mut merged = Vec::new();
    let mut y_offset = 0.0f32;

    for page in pages {
        for run in &page.runs {
            let text = normalize_text(&run.text);
            if text.trim().is_empty() {
                continue;
            }
            let mut run = run.clone();
            run.text = text;
            run.y -= y_offset;
            merged.push(run);
        }
        y_offset += page.height;
    }

    merged
}

/// NFKC-normalize and canonicalize whitespace in run text.
fn normalize_text(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    normalized
        .chars()
        .map(|c| if c == '\u{00A0}' || c == '\u{202F}' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_edges() {
        let run = TextRun::new("78 615 440", 470.0, 700.0, 60.0, 9.0);
        assert_eq!(run.right(), 530.0);
        assert_eq!(run.center(), 500.0);
    }

    #[test]
    fn test_normalize_text_nbsp() {
        assert_eq!(normalize_text("3\u{00A0}000\u{202F}000"), "3 000 000");
        assert_eq!(normalize_text("  IMPAYE  "), "IMPAYE");
    }

    #[test]
    fn test_merge_pages_preserves_order_and_offsets() {
        let mut p1 = PageContent::new(595.0, 842.0);
        p1.push(TextRun::new("first", 50.0, 800.0, 30.0, 9.0));
        let mut p2 = PageContent::new(595.0, 842.0);
        p2.push(TextRun::new("second", 50.0, 800.0, 30.0, 9.0));

        let merged = merge_pages(&[p1, p2]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "first");
        assert_eq!(merged[1].text, "second");
        // Page 2 content sits below page 1 after the offset.
        assert!(merged[1].y < merged[0].y);
    }

    #[test]
    fn test_merge_pages_drops_empty_runs() {
        let mut page = PageContent::new(595.0, 842.0);
        page.push(TextRun::new("   ", 10.0, 100.0, 5.0, 9.0));
        page.push(TextRun::new("data", 10.0, 90.0, 20.0, 9.0));
        let merged = merge_pages(&[page]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "data");
    }
}
