//! Column assignment: map every run to exactly one zone.
//!
//! Each run is scored against the zones it geometrically overlaps. Zone
//! membership earns a base score, right-edge proximity earns a bonus in
//! right-aligned zones, matching the zone's content type earns a bonus, and
//! left-aligned zones penalize distance from the zone center. The highest
//! score wins; ties go to the nearest zone center.

use regex::Regex;

use crate::extract::parse_amount;

use super::rows::Row;
use super::run::TextRun;
use super::zones::{Alignment, ColumnZone, ContentKind, ZoneModel, NA_PLACEHOLDER};

const MEMBERSHIP_SCORE: f32 = 1.0;
const RIGHT_EDGE_BONUS: f32 = 0.75;
const CONTENT_BONUS: f32 = 0.5;
const CENTER_PENALTY_WEIGHT: f32 = 0.5;
/// Right-aligned runs must end within this fraction of the zone width from
/// the zone's right edge to earn the alignment bonus.
const RIGHT_EDGE_FRACTION: f32 = 0.25;

/// Decides whether a numeric run is a genuine monetary amount rather than a
/// check or reference number.
pub struct AmountFilter {
    date_re: Regex,
    integer_re: Regex,
    amount_re: Regex,
    floor: i64,
}

impl AmountFilter {
    /// Create a filter with the given materiality floor.
    pub fn new(floor: i64) -> Self {
        Self {
            date_re: Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap(),
            integer_re: Regex::new(r"^\d+$").unwrap(),
            amount_re: Regex::new(r"^\d[\d ]*$").unwrap(),
            floor,
        }
    }

    /// Whether the text matches `DD/MM/YYYY`.
    pub fn is_date(&self, text: &str) -> bool {
        self.date_re.is_match(text.trim())
    }

    /// Whether the text is a plain unspaced integer.
    pub fn is_integer(&self, text: &str) -> bool {
        self.integer_re.is_match(text.trim())
    }

    /// Whether the text has the digits-and-spaces shape of an amount.
    pub fn matches_amount_shape(&self, text: &str) -> bool {
        let trimmed = text.trim();
        self.amount_re.is_match(trimmed) && trimmed.chars().filter(|c| c.is_ascii_digit()).count() >= 3
    }

    /// The strict amount rule set.
    ///
    /// `inside_amount_zone` is the geometric precondition; the text must
    /// look like an amount, must not be a date, must not be a short plain
    /// integer (those are check and reference numbers), and its value must
    /// clear the materiality floor.
    pub fn is_amount(&self, text: &str, inside_amount_zone: bool) -> bool {
        if !inside_amount_zone {
            return false;
        }
        let trimmed = text.trim();
        if !self.matches_amount_shape(trimmed) || self.is_date(trimmed) {
            return false;
        }
        if self.is_integer(trimmed) && trimmed.len() <= 6 {
            return false;
        }
        parse_amount(trimmed) > self.floor
    }
}

/// Assigns runs to zones and distributes them into row cells.
pub struct ColumnAssigner {
    model: ZoneModel,
    filter: AmountFilter,
}

impl ColumnAssigner {
    /// Create an assigner over the given zone model.
    pub fn new(model: ZoneModel, materiality_floor: i64) -> Self {
        Self {
            model,
            filter: AmountFilter::new(materiality_floor),
        }
    }

    /// The underlying zone model.
    pub fn model(&self) -> &ZoneModel {
        &self.model
    }

    /// The strict amount filter in use.
    pub fn filter(&self) -> &AmountFilter {
        &self.filter
    }

    /// Distribute every run of every row into its winning column cell.
    ///
    /// Rows left without an amount cell get a synthetic [`NA_PLACEHOLDER`]
    /// run so that row alignment survives for the field parsers.
    pub fn distribute(&self, rows: &mut [Row]) {
        let amount_index = self.model.amount_zone().map(|z| z.index);

        for row in rows.iter_mut() {
            row.cells.clear();
            let runs = row.runs.clone();
            for run in runs {
                if let Some(column) = self.assign(&run) {
                    row.cells.entry(column).or_default().push(run);
                }
            }

            if let Some(amount_index) = amount_index {
                if !row.cells.is_empty() && !row.cells.contains_key(&amount_index) {
                    let zone = &self.model.zones[amount_index];
                    let placeholder =
                        TextRun::new(NA_PLACEHOLDER, zone.center(), row.y_start, 0.0, 0.0);
                    row.cells.insert(amount_index, vec![placeholder]);
                }
            }
        }
    }

    /// Pick the winning zone for one run.
    ///
    /// Returns `None` only when no zones exist at all; otherwise the
    /// nearest-center fallback guarantees an assignment.
    pub fn assign(&self, run: &TextRun) -> Option<usize> {
        if self.model.zones.is_empty() {
            return None;
        }

        let mut best: Option<(f32, usize)> = None;
        for zone in &self.model.zones {
            if !self.overlaps(run, zone) {
                continue;
            }
            if zone.content == ContentKind::Amount
                && !self.filter.is_amount(&run.text, true)
            {
                // Reference numbers stay out of the amount column.
                continue;
            }
            let score = self.score(run, zone);
            best = match best {
                Some((s, i)) if score < s => Some((s, i)),
                Some((s, i)) if (score - s).abs() < f32::EPSILON => {
                    // Tie: nearest zone center wins.
                    let current = (run.center() - self.model.zones[i].center()).abs();
                    let challenger = (run.center() - zone.center()).abs();
                    if challenger < current {
                        Some((score, zone.index))
                    } else {
                        Some((s, i))
                    }
                }
                _ => Some((score, zone.index)),
            };
        }

        best.map(|(_, i)| i)
            .or_else(|| self.nearest_non_amount_zone(run))
    }

    fn overlaps(&self, run: &TextRun, zone: &ColumnZone) -> bool {
        zone.contains(run.x) || zone.contains(run.center()) || zone.contains(run.right())
    }

    fn score(&self, run: &TextRun, zone: &ColumnZone) -> f32 {
        let mut score = MEMBERSHIP_SCORE;

        if zone.alignment == Alignment::Right {
            let edge_distance = (zone.x_end - run.right()).abs();
            if edge_distance <= zone.width() * RIGHT_EDGE_FRACTION {
                score += RIGHT_EDGE_BONUS;
            }
        }

        let content_ok = match zone.content {
            ContentKind::Date => self.filter.is_date(&run.text),
            ContentKind::Integer => self.filter.is_integer(&run.text),
            ContentKind::Amount => self.filter.matches_amount_shape(&run.text),
            ContentKind::Text => !self.filter.is_date(&run.text),
        };
        if content_ok {
            score += CONTENT_BONUS;
        }

        if zone.alignment == Alignment::Left && zone.width() > 0.0 {
            let normalized = ((run.center() - zone.center()).abs() / zone.width()).min(1.0);
            score -= normalized * CENTER_PENALTY_WEIGHT;
        }

        score
    }

    /// Nearest-zone fallback for runs that overlap nothing (or only the
    /// amount zone while failing the strict filter).
    fn nearest_non_amount_zone(&self, run: &TextRun) -> Option<usize> {
        self.model
            .zones
            .iter()
            .filter(|z| z.content != ContentKind::Amount || self.filter.is_amount(&run.text, true))
            .min_by(|a, b| {
                let da = (run.center() - a.center()).abs();
                let db = (run.center() - b.center()).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|z| z.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::rows::RowGrouper;
    use crate::layout::zones::{ZoneModel, ZoneSource, ZoneSpec};

    fn test_model() -> ZoneModel {
        let specs = [
            ZoneSpec {
                name: "date",
                x_min: 40.0,
                x_max: 110.0,
                alignment: Alignment::Left,
                content: ContentKind::Date,
            },
            ZoneSpec {
                name: "description",
                x_min: 110.0,
                x_max: 420.0,
                alignment: Alignment::Left,
                content: ContentKind::Text,
            },
            ZoneSpec {
                name: "amount",
                x_min: 420.0,
                x_max: 560.0,
                alignment: Alignment::Right,
                content: ContentKind::Amount,
            },
        ];
        ZoneModel::calibrated("test", &specs, 595.0, 595.0)
    }

    fn make_run(text: &str, x: f32, width: f32) -> TextRun {
        TextRun::new(text, x, 700.0, width, 9.0)
    }

    #[test]
    fn test_amount_filter_accepts_real_amounts() {
        let filter = AmountFilter::new(500);
        assert!(filter.is_amount("3 000 000", true));
        assert!(filter.is_amount("147 500", true));
        // Plain integers above six digits are amounts too.
        assert!(filter.is_amount("78615440", true));
    }

    #[test]
    fn test_amount_filter_rejects_references_and_dates() {
        let filter = AmountFilter::new(500);
        // Short plain integer: a check/reference number.
        assert!(!filter.is_amount("100302", true));
        assert!(!filter.is_amount("24/06/2025", true));
        // Below the materiality floor.
        assert!(!filter.is_amount("4 50", true));
        // Geometric precondition.
        assert!(!filter.is_amount("3 000 000", false));
        assert!(!filter.is_amount("", true));
        assert!(!filter.is_amount("N/A", true));
    }

    #[test]
    fn test_assign_by_zone_and_content() {
        let assigner = ColumnAssigner::new(test_model(), 500);

        let date = make_run("24/06/2025", 45.0, 50.0);
        assert_eq!(assigner.assign(&date), Some(0));

        let desc = make_run("VIREMENT CLIENT", 150.0, 90.0);
        assert_eq!(assigner.assign(&desc), Some(1));

        let amount = make_run("78 615 440", 480.0, 60.0);
        assert_eq!(assigner.assign(&amount), Some(2));
    }

    #[test]
    fn test_reference_number_in_amount_zone_falls_back() {
        let assigner = ColumnAssigner::new(test_model(), 500);
        // A 6-digit reference sitting in the amount zone must not become an
        // amount; nearest non-amount zone picks it up instead.
        let reference = make_run("100302", 470.0, 36.0);
        assert_eq!(assigner.assign(&reference), Some(1));
    }

    #[test]
    fn test_distribute_backfills_missing_amount() {
        let assigner = ColumnAssigner::new(test_model(), 500);
        let grouper = RowGrouper::new(4.0);
        let mut rows = grouper.group(vec![
            make_run("24/06/2025", 45.0, 50.0),
            make_run("CHEQUE FOURNISSEUR", 150.0, 100.0),
        ]);

        assigner.distribute(&mut rows);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell_text(2), NA_PLACEHOLDER);
    }

    #[test]
    fn test_distribute_keeps_amounts() {
        let assigner = ColumnAssigner::new(test_model(), 500);
        let grouper = RowGrouper::new(4.0);
        let mut rows = grouper.group(vec![
            make_run("02/06/2025", 45.0, 50.0),
            make_run("REMISE CHEQUE", 150.0, 80.0),
            make_run("2 500 000", 490.0, 55.0),
        ]);

        assigner.distribute(&mut rows);
        assert_eq!(rows[0].cell_text(0), "02/06/2025");
        assert_eq!(rows[0].cell_text(1), "REMISE CHEQUE");
        assert_eq!(rows[0].cell_text(2), "2 500 000");
    }

    #[test]
    fn test_adaptive_model_assignment() {
        let xs = vec![45.0, 46.0, 150.0, 152.0, 480.0, 482.0];
        let model = ZoneModel::adaptive(&xs, Some(3), 8, 100);
        assert_eq!(model.source, ZoneSource::Adaptive);
        let assigner = ColumnAssigner::new(model, 500);

        let amount = make_run("1 250 000", 480.0, 55.0);
        assert_eq!(assigner.assign(&amount), Some(2));
    }
}
