//! Row grouping: horizontal bands of runs that share a baseline.

use std::collections::BTreeMap;

use super::run::TextRun;

/// A horizontal band of runs, optionally distributed into column cells.
#[derive(Debug, Clone, Default)]
pub struct Row {
    /// Highest y in the band (PDF coords, so the visual top).
    pub y_start: f32,
    /// Lowest y in the band.
    pub y_end: f32,
    /// Position of the row in top-to-bottom document order.
    pub index: usize,
    /// Member runs sorted by x.
    pub runs: Vec<TextRun>,
    /// Runs per column index, filled by the assignment engine.
    pub cells: BTreeMap<usize, Vec<TextRun>>,
}

impl Row {
    /// Concatenated row text with single spaces between runs.
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text of one cell, joined with spaces; empty when the cell is absent.
    pub fn cell_text(&self, column: usize) -> String {
        self.cells
            .get(&column)
            .map(|runs| {
                runs.iter()
                    .map(|r| r.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Groups runs into rows by walking y positions with a tolerance.
pub struct RowGrouper {
    tolerance: f32,
}

impl RowGrouper {
    /// Create a grouper with the given y tolerance in points.
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    /// Group runs into ordered rows, top to bottom.
    ///
    /// Runs are first sorted by y descending (PDF y grows upward) then x,
    /// so the result does not depend on arrival order. A new row starts
    /// whenever the gap to the running row's y exceeds the tolerance.
    pub fn group(&self, runs: Vec<TextRun>) -> Vec<Row> {
        if runs.is_empty() {
            return vec![];
        }

        let mut runs = runs;
        runs.sort_by(|a, b| {
            let y_cmp = b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal);
            if y_cmp == std::cmp::Ordering::Equal {
                a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
            } else {
                y_cmp
            }
        });

        let mut rows: Vec<Row> = Vec::new();
        let mut current: Vec<TextRun> = Vec::new();
        let mut current_y: Option<f32> = None;

        for run in runs {
            match current_y {
                Some(y) if (run.y - y).abs() <= self.tolerance => {
                    current.push(run);
                }
                _ => {
                    if !current.is_empty() {
                        rows.push(Self::build_row(std::mem::take(&mut current), rows.len()));
                    }
                    current_y = Some(run.y);
                    current.push(run);
                }
            }
        }

        if !current.is_empty() {
            rows.push(Self::build_row(current, rows.len()));
        }

        log::debug!("RowGrouper: grouped into {} rows", rows.len());
        rows
    }

    fn build_row(mut runs: Vec<TextRun>, index: usize) -> Row {
        runs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let y_start = runs
            .iter()
            .map(|r| r.y)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(0.0);
        let y_end = runs
            .iter()
            .map(|r| r.y)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(0.0);

        Row {
            y_start,
            y_end,
            index,
            runs,
            cells: BTreeMap::new(),
        }
    }
}
