//! Aggregate extraction result, validation summary, and diagnostics.

use serde::{Deserialize, Serialize};

use super::record::{to_iso_date, Check, Deposit, Facility, OpeningBalance, SectionRecord, UnpaidItem};

/// Outcome of the accounting-identity check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// `opening + total deposits - total checks`.
    pub calculated_closing: i64,
    /// Whether `|calculated - declared| < tolerance`.
    pub is_valid: bool,
    /// `calculated - declared`, signed.
    pub discrepancy: i64,
}

/// The complete extraction result for one document.
///
/// Totals are derived from the item lists; `recompute_totals` keeps them in
/// sync after the lists are built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementExtractionResult {
    /// Statement date in ISO 8601 form, when one was found.
    pub report_date: Option<String>,
    /// Opening balance line, when one was found.
    pub opening_balance: Option<OpeningBalance>,
    /// Deposits not yet cleared.
    pub deposits: Vec<Deposit>,
    /// Sum of deposit amounts.
    pub total_deposits: i64,
    /// Checks not yet cleared.
    pub checks: Vec<Check>,
    /// Sum of check amounts.
    pub total_checks: i64,
    /// Declared closing balance in whole FCFA.
    pub closing_balance: i64,
    /// Credit facilities.
    pub facilities: Vec<Facility>,
    /// Sum of drawn facility amounts.
    pub total_facilities: i64,
    /// Dishonored items.
    pub unpaid_items: Vec<UnpaidItem>,
    /// Accounting-identity check.
    pub validation: ValidationSummary,
    /// Data-quality warnings accumulated during extraction.
    pub warnings: Vec<String>,
}

impl StatementExtractionResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the derived totals and the report date from the item lists.
    pub fn recompute_totals(&mut self) {
        self.total_deposits = self.deposits.iter().map(|d| d.amount).sum();
        self.total_checks = self.checks.iter().map(|c| c.amount).sum();
        self.total_facilities = self.facilities.iter().map(|f| f.used).sum();
        if self.report_date.is_none() {
            if let Some(opening) = &self.opening_balance {
                self.report_date = to_iso_date(&opening.date);
            }
        }
    }

    /// Record a data-quality warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Total count of extracted line items across all sections.
    pub fn item_count(&self) -> usize {
        self.deposits.len() + self.checks.len() + self.facilities.len() + self.unpaid_items.len()
    }

    /// Flatten the result into tagged records, in statement order.
    pub fn records(&self) -> Vec<SectionRecord> {
        let mut out = Vec::with_capacity(self.item_count() + 2);
        if let Some(opening) = &self.opening_balance {
            out.push(SectionRecord::OpeningBalance(opening.clone()));
        }
        out.extend(self.deposits.iter().cloned().map(SectionRecord::Deposit));
        out.extend(self.checks.iter().cloned().map(SectionRecord::Check));
        out.extend(self.facilities.iter().cloned().map(SectionRecord::Facility));
        out.extend(self.unpaid_items.iter().cloned().map(SectionRecord::Unpaid));
        out.push(SectionRecord::ClosingBalance {
            amount: self.closing_balance,
        });
        out
    }
}

/// Which extraction strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Order-preserving regex pass over the concatenated page text.
    Textual,
    /// Full geometric pipeline (rows, zones, sections).
    Geometric,
}

/// Confidence in the selected strategy, derived from the score gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    /// Score gap of at most 1.
    Low,
    /// Score gap of 2.
    Medium,
    /// Score gap of 3 or more.
    High,
}

/// Per-strategy comparison score with the counts that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyScore {
    /// Comparison points awarded.
    pub score: u32,
    /// Deposits extracted.
    pub deposit_count: usize,
    /// Checks extracted.
    pub check_count: usize,
    /// Whether the accounting identity held.
    pub passed_validation: bool,
    /// Absolute validation discrepancy.
    pub abs_discrepancy: i64,
}

/// Diagnostic bundle for UI and manual QA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDiagnostics {
    /// Identifier of the matched calibrated template, if any.
    pub template: Option<String>,
    /// Whether zones came from a calibrated table or adaptive clustering.
    pub calibrated_zones: bool,
    /// Ordered zone boundaries used by the geometric strategy.
    pub zone_bounds: Vec<(f32, f32)>,
    /// Winning strategy.
    pub selected: StrategyKind,
    /// Confidence label for the selection.
    pub confidence: Confidence,
    /// Textual-strategy score breakdown.
    pub textual: StrategyScore,
    /// Geometric-strategy score breakdown.
    pub geometric: StrategyScore,
}

impl ExtractionDiagnostics {
    /// Serialize the bundle to pretty JSON for QA artifacts.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::Error::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompute_totals() {
        let mut result = StatementExtractionResult::new();
        result.opening_balance = Some(OpeningBalance::new("24/06/2025", 1_000));
        result.deposits.push(Deposit {
            amount: 300,
            ..Default::default()
        });
        result.deposits.push(Deposit {
            amount: 700,
            ..Default::default()
        });
        result.checks.push(Check {
            amount: 450,
            ..Default::default()
        });

        result.recompute_totals();
        assert_eq!(result.total_deposits, 1_000);
        assert_eq!(result.total_checks, 450);
        assert_eq!(result.report_date.as_deref(), Some("2025-06-24"));
        assert_eq!(result.item_count(), 3);
    }

    #[test]
    fn test_records_preserve_statement_order() {
        let mut result = StatementExtractionResult::new();
        result.opening_balance = Some(OpeningBalance::new("24/06/2025", 1_000));
        result.deposits.push(Deposit {
            amount: 300,
            ..Default::default()
        });
        result.checks.push(Check {
            amount: 450,
            ..Default::default()
        });
        result.closing_balance = 850;

        let records = result.records();
        assert_eq!(records.len(), 4);
        assert!(matches!(records[0], SectionRecord::OpeningBalance(_)));
        assert!(matches!(records[1], SectionRecord::Deposit(_)));
        assert!(matches!(records[2], SectionRecord::Check(_)));
        assert_eq!(records[3], SectionRecord::ClosingBalance { amount: 850 });
        assert_eq!(records.iter().map(|r| r.amount()).sum::<i64>(), 2_600);
    }

    #[test]
    fn test_diagnostics_serialize() {
        let diag = ExtractionDiagnostics {
            template: Some("fcfa-bank-v1".to_string()),
            calibrated_zones: true,
            zone_bounds: vec![(40.0, 110.0), (470.0, 560.0)],
            selected: StrategyKind::Geometric,
            confidence: Confidence::High,
            textual: StrategyScore::default(),
            geometric: StrategyScore {
                score: 4,
                deposit_count: 5,
                check_count: 2,
                passed_validation: true,
                abs_discrepancy: 0,
            },
        };
        let json = diag.to_json().unwrap();
        assert!(json.contains("fcfa-bank-v1"));
        assert!(json.contains("Geometric"));
    }
}
