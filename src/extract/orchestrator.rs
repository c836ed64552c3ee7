//! Dual-strategy orchestration.
//!
//! Runs the textual and geometric passes over the same pages, scores the
//! two results against each other, and keeps the better one. The score
//! rewards item yield and a passing accounting identity; the gap between
//! the two scores becomes the confidence label.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::layout::{merge_pages, PageContent, RowGrouper};
use crate::model::{
    Confidence, ExtractionDiagnostics, StatementExtractionResult, StrategyKind, StrategyScore,
};
use crate::options::ExtractOptions;
use crate::template::{fcfa_bank_v1, TemplateRegistry};

use super::geometric::{GeometricExtractor, GeometricOutput};
use super::textual::TextualExtractor;

/// Points for passing the accounting identity when the other strategy
/// failed it; item-yield and discrepancy edges are worth one point each.
const VALIDATION_POINTS: u32 = 2;
/// Score gap at or above which the selection is high confidence.
const HIGH_CONFIDENCE_GAP: u32 = 3;
/// Score gap at or below which the selection is low confidence.
const LOW_CONFIDENCE_GAP: u32 = 1;

/// The selected result with the comparison that produced it.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub result: StatementExtractionResult,
    pub diagnostics: ExtractionDiagnostics,
}

/// Runs both extraction strategies and arbitrates between them.
pub struct Orchestrator {
    registry: TemplateRegistry,
    options: ExtractOptions,
}

impl Orchestrator {
    pub fn new(options: ExtractOptions) -> Self {
        Orchestrator {
            registry: TemplateRegistry::with_builtins(),
            options,
        }
    }

    pub fn with_registry(registry: TemplateRegistry, options: ExtractOptions) -> Self {
        Orchestrator { registry, options }
    }

    /// Extract a statement from positioned page content.
    pub fn extract(&self, pages: &[PageContent]) -> Result<ExtractionOutcome> {
        if !pages.iter().any(|p| p.has_text()) {
            return Err(Error::EmptyDocument);
        }

        // Both strategies read the same row grid text; the geometric pass
        // re-derives its own rows with column assignment on top.
        let runs = merge_pages(pages);
        let lines: Vec<String> = RowGrouper::new(self.options.row_tolerance)
            .group(runs)
            .iter()
            .map(|r| r.text())
            .collect();

        let template = self
            .registry
            .detect(&lines.join(" "), self.options.detector_threshold)
            .unwrap_or_else(|| Arc::new(fcfa_bank_v1()));

        let geometric =
            GeometricExtractor::with_registry(self.registry.clone(), self.options.clone());
        let textual = TextualExtractor::new(template, self.options.clone());

        let (geo, tex) = if self.options.parallel {
            rayon::join(|| geometric.extract(pages), || textual.extract(&lines))
        } else {
            (geometric.extract(pages), textual.extract(&lines))
        };

        match (geo, tex) {
            (Ok(geo), Ok(tex)) => Ok(self.arbitrate(geo, tex)),
            (Ok(geo), Err(err)) => {
                log::warn!("Orchestrator: textual strategy failed: {err}");
                let mut outcome = self.single(geo, StrategyKind::Geometric);
                outcome
                    .result
                    .warn(format!("textual strategy failed: {err}"));
                Ok(outcome)
            }
            (Err(err), Ok(tex)) => {
                log::warn!("Orchestrator: geometric strategy failed: {err}");
                let mut result = tex;
                result.warn(format!("geometric strategy failed: {err}"));
                let score = score_of(&result);
                Ok(ExtractionOutcome {
                    diagnostics: ExtractionDiagnostics {
                        template: None,
                        calibrated_zones: false,
                        zone_bounds: Vec::new(),
                        selected: StrategyKind::Textual,
                        confidence: Confidence::Low,
                        textual: score,
                        geometric: StrategyScore::default(),
                    },
                    result,
                })
            }
            (Err(geo_err), Err(tex_err)) => Err(Error::BothStrategiesFailed {
                geometric: geo_err.to_string(),
                textual: tex_err.to_string(),
            }),
        }
    }

    /// Score both results and keep the winner. A tie keeps the geometric
    /// result at low confidence.
    fn arbitrate(&self, geo: GeometricOutput, tex: StatementExtractionResult) -> ExtractionOutcome {
        let (geo_score, tex_score) = score_pair(&geo.result, &tex);
        let (selected, confidence) = select(geo_score.score, tex_score.score);

        log::debug!(
            "Orchestrator: geometric={} textual={} selected={:?} ({:?})",
            geo_score.score,
            tex_score.score,
            selected,
            confidence
        );

        let diagnostics = ExtractionDiagnostics {
            template: geo.template,
            calibrated_zones: geo.calibrated,
            zone_bounds: geo.zone_bounds,
            selected,
            confidence,
            textual: tex_score,
            geometric: geo_score,
        };

        let result = match selected {
            StrategyKind::Geometric => geo.result,
            StrategyKind::Textual => tex,
        };
        ExtractionOutcome {
            result,
            diagnostics,
        }
    }

    fn single(&self, geo: GeometricOutput, selected: StrategyKind) -> ExtractionOutcome {
        let score = score_of(&geo.result);
        ExtractionOutcome {
            diagnostics: ExtractionDiagnostics {
                template: geo.template,
                calibrated_zones: geo.calibrated,
                zone_bounds: geo.zone_bounds,
                selected,
                confidence: Confidence::Low,
                textual: StrategyScore::default(),
                geometric: score,
            },
            result: geo.result,
        }
    }
}

/// One-call extraction with default options and builtin templates.
pub fn extract_statement(pages: &[PageContent]) -> Result<ExtractionOutcome> {
    Orchestrator::new(ExtractOptions::default()).extract(pages)
}

fn score_of(result: &StatementExtractionResult) -> StrategyScore {
    StrategyScore {
        score: 0,
        deposit_count: result.deposits.len(),
        check_count: result.checks.len(),
        passed_validation: result.validation.is_valid,
        abs_discrepancy: result.validation.discrepancy.abs(),
    }
}

/// Relative scoring: a point for the larger deposit yield, a point for the
/// larger check yield, two points for passing the identity the other side
/// failed, and a point for the smaller absolute discrepancy.
fn score_pair(
    geo: &StatementExtractionResult,
    tex: &StatementExtractionResult,
) -> (StrategyScore, StrategyScore) {
    let mut geo_score = score_of(geo);
    let mut tex_score = score_of(tex);

    match geo_score.deposit_count.cmp(&tex_score.deposit_count) {
        std::cmp::Ordering::Greater => geo_score.score += 1,
        std::cmp::Ordering::Less => tex_score.score += 1,
        std::cmp::Ordering::Equal => {}
    }
    match geo_score.check_count.cmp(&tex_score.check_count) {
        std::cmp::Ordering::Greater => geo_score.score += 1,
        std::cmp::Ordering::Less => tex_score.score += 1,
        std::cmp::Ordering::Equal => {}
    }
    if geo_score.passed_validation && !tex_score.passed_validation {
        geo_score.score += VALIDATION_POINTS;
    }
    if tex_score.passed_validation && !geo_score.passed_validation {
        tex_score.score += VALIDATION_POINTS;
    }
    match geo_score.abs_discrepancy.cmp(&tex_score.abs_discrepancy) {
        std::cmp::Ordering::Less => geo_score.score += 1,
        std::cmp::Ordering::Greater => tex_score.score += 1,
        std::cmp::Ordering::Equal => {}
    }

    (geo_score, tex_score)
}

fn select(geo: u32, tex: u32) -> (StrategyKind, Confidence) {
    let (selected, gap) = if tex > geo {
        (StrategyKind::Textual, tex - geo)
    } else {
        // Ties keep the geometric result.
        (StrategyKind::Geometric, geo - tex)
    };
    let confidence = if gap >= HIGH_CONFIDENCE_GAP {
        Confidence::High
    } else if gap <= LOW_CONFIDENCE_GAP {
        Confidence::Low
    } else {
        Confidence::Medium
    };
    (selected, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TextRun;
    use crate::model::{Check, Deposit, ValidationSummary};

    fn result_with(deposits: usize, checks: usize, valid: bool, disc: i64) -> StatementExtractionResult {
        let mut result = StatementExtractionResult::default();
        for _ in 0..deposits {
            result.deposits.push(Deposit::default());
        }
        for _ in 0..checks {
            result.checks.push(Check::default());
        }
        result.validation = ValidationSummary {
            calculated_closing: 0,
            is_valid: valid,
            discrepancy: disc,
        };
        result
    }

    #[test]
    fn test_score_pair_geometric_wins() {
        let geo = result_with(5, 2, true, 0);
        let tex = result_with(3, 2, false, 900);
        let (gs, ts) = score_pair(&geo, &tex);
        // Deposits +1, validation +2, discrepancy +1.
        assert_eq!(gs.score, 4);
        assert_eq!(ts.score, 0);
    }

    #[test]
    fn test_select_confidence_bands() {
        assert_eq!(select(4, 0), (StrategyKind::Geometric, Confidence::High));
        assert_eq!(select(3, 1), (StrategyKind::Geometric, Confidence::Medium));
        assert_eq!(select(2, 1), (StrategyKind::Geometric, Confidence::Low));
        assert_eq!(select(1, 4), (StrategyKind::Textual, Confidence::High));
    }

    #[test]
    fn test_tie_keeps_geometric_at_low_confidence() {
        assert_eq!(select(2, 2), (StrategyKind::Geometric, Confidence::Low));
    }

    fn statement_page() -> PageContent {
        let lines = [
            "OPENING BALANCE 24/06/2025 78 615 440",
            "ADD : DEPOSIT NOT YET CLEARED",
            "02/06/2025 03/06/2025 REMISE CHEQUE ACME CLIENTA 2 500 000",
            "04/06/2025 05/06/2025 VIREMENT RECU BETA CLIENTB 500 000",
            "TOTAL DEPOSIT (A) 3 000 000",
            "LESS : CHECK NOT YET CLEARED",
            "05/06/2025 0004512 FOURNISSEUR BUREAU 147 500",
            "06/06/2025 0004513 LOYER JUIN 137 783",
            "TOTAL (B) 285 283",
            "CLOSING BALANCE as per Book : C=(A-B) 81 330 157 FCFA",
        ];
        let mut page = PageContent::new(595.0, 842.0);
        for (i, line) in lines.iter().enumerate() {
            let y = 800.0 - i as f32 * 14.0;
            let mut x = 40.0;
            for token in line.split_whitespace() {
                let width = token.len() as f32 * 5.0;
                page.push(TextRun::new(token, x, y, width, 9.0));
                x += width + 6.0;
            }
        }
        page
    }

    #[test]
    fn test_end_to_end_extraction() {
        let outcome = extract_statement(&[statement_page()]).unwrap();
        let result = &outcome.result;
        assert_eq!(result.opening_balance.as_ref().unwrap().amount, 78_615_440);
        assert_eq!(result.total_deposits, 3_000_000);
        assert_eq!(result.total_checks, 285_283);
        assert_eq!(result.closing_balance, 81_330_157);
        assert!(result.validation.is_valid);
        assert_eq!(result.report_date.as_deref(), Some("2025-06-24"));
        assert_eq!(outcome.diagnostics.template.as_deref(), Some("fcfa-bank-v1"));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let parallel = extract_statement(&[statement_page()]).unwrap();
        let sequential = Orchestrator::new(ExtractOptions::default().sequential())
            .extract(&[statement_page()])
            .unwrap();
        assert_eq!(parallel.result, sequential.result);
    }

    #[test]
    fn test_empty_pages() {
        let err = extract_statement(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }
}
