//! Keyword-anchored section segmentation.
//!
//! Slices the row grid into named, non-overlapping sections. A section
//! opens at the first row containing one of its start anchors and closes at
//! one of its end anchors or at the next section's start. Denylisted rows
//! (totals, column headers, noise) are kept out of the data stream so they
//! cannot pollute zone content.

use crate::layout::Row;
use crate::model::SectionKind;
use crate::template::StatementTemplate;

/// A named slice of the row grid.
#[derive(Debug, Clone)]
pub struct Section {
    /// Which statement section this is.
    pub kind: SectionKind,
    /// y of the anchor row.
    pub start_y: f32,
    /// y of the last member row.
    pub end_y: f32,
    /// Data rows, top to bottom, denylist already applied.
    pub rows: Vec<Row>,
    /// The row the anchor matched on (holds the data for balance lines).
    pub anchor_row: Row,
    /// Detected column-header row, when the section had one.
    pub header_row: Option<Row>,
}

impl Section {
    /// Concatenated text of all data rows.
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .map(|r| r.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Data-row text, one string per row.
    pub fn line_texts(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.text()).collect()
    }

    /// Anchor text followed by data-row text. Balance amounts usually sit
    /// on the anchor line itself; unpaid anchors double as data rows.
    pub fn lines_with_anchor(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.anchor_row.text());
        lines.extend(self.line_texts());
        lines
    }
}

/// Splits rows into sections using a template's anchor vocabulary.
pub struct SectionSegmenter<'a> {
    template: &'a StatementTemplate,
}

impl<'a> SectionSegmenter<'a> {
    /// Create a segmenter for the given template.
    pub fn new(template: &'a StatementTemplate) -> Self {
        Self { template }
    }

    /// Segment rows into ordered, disjoint sections.
    pub fn segment(&self, rows: &[Row]) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        let mut open: Option<Section> = None;
        let mut seen: Vec<SectionKind> = Vec::new();

        for row in rows {
            let upper = row.text().to_uppercase();

            // The next start anchor closes whatever is open.
            if let Some(kind) = self.match_start(&upper, &seen) {
                if let Some(section) = open.take() {
                    sections.push(section);
                }
                seen.push(kind);
                open = Some(Section {
                    kind,
                    start_y: row.y_start,
                    end_y: row.y_end,
                    rows: Vec::new(),
                    anchor_row: row.clone(),
                    header_row: None,
                });
                log::debug!("SectionSegmenter: opened {:?} at y={:.1}", kind, row.y_start);
                continue;
            }

            let Some(section) = open.as_mut() else {
                continue;
            };

            if self.matches_end(&upper, section.kind) {
                log::debug!("SectionSegmenter: closed {:?} at y={:.1}", section.kind, row.y_start);
                sections.push(open.take().unwrap());
                continue;
            }

            if self.template.is_denied(&upper) {
                // Column headers are worth remembering for diagnostics.
                if section.header_row.is_none() && upper.contains("DATE") {
                    section.header_row = Some(row.clone());
                }
                continue;
            }

            section.end_y = row.y_end;
            section.rows.push(row.clone());
        }

        if let Some(section) = open {
            sections.push(section);
        }

        sections
    }

    fn match_start(&self, upper: &str, seen: &[SectionKind]) -> Option<SectionKind> {
        for anchor in &self.template.anchors {
            if seen.contains(&anchor.kind) {
                continue;
            }
            if anchor.starts.iter().any(|s| upper.contains(s)) {
                return Some(anchor.kind);
            }
        }
        None
    }

    fn matches_end(&self, upper: &str, kind: SectionKind) -> bool {
        self.template
            .anchors
            .iter()
            .filter(|a| a.kind == kind)
            .any(|a| a.ends.iter().any(|e| upper.contains(e)))
    }
}
