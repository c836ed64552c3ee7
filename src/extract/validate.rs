//! Accounting-identity validation.

use crate::model::{StatementExtractionResult, ValidationSummary};

/// Check the statement identity: opening + deposits - checks = closing.
///
/// The calculated closing balance is compared against the declared one;
/// a discrepancy strictly below `tolerance` (rounding noise on scanned
/// statements) still counts as valid. The discrepancy sign is calculated
/// minus declared.
pub fn validate(result: &StatementExtractionResult, tolerance: i64) -> ValidationSummary {
    let opening = result.opening_balance.as_ref().map(|b| b.amount).unwrap_or(0);
    let calculated_closing = opening + result.total_deposits - result.total_checks;
    let discrepancy = calculated_closing - result.closing_balance;

    ValidationSummary {
        calculated_closing,
        is_valid: discrepancy.abs() < tolerance,
        discrepancy,
    }
}
