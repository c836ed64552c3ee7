//! Domain records for the statement sections.
//!
//! Dates are kept in the source `DD/MM/YYYY` form; the `iso_date` helpers
//! convert to ISO 8601 at the subsystem boundary. Amounts are whole FCFA
//! (the currency has no minor unit) and are never negative.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The named statement sections a row can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Opening balance line.
    OpeningBalance,
    /// Deposits not yet cleared by the bank.
    Deposits,
    /// Checks issued but not yet debited.
    Checks,
    /// Authorized credit facilities.
    Facilities,
    /// Dishonored payment items.
    Unpaid,
    /// Closing balance line.
    ClosingBalance,
}

impl SectionKind {
    /// Human-readable section title.
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::OpeningBalance => "Opening balance",
            SectionKind::Deposits => "Deposits not yet cleared",
            SectionKind::Checks => "Checks not yet cleared",
            SectionKind::Facilities => "Bank facilities",
            SectionKind::Unpaid => "Unpaid items",
            SectionKind::ClosingBalance => "Closing balance",
        }
    }
}

/// Opening balance of the statement period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningBalance {
    /// Statement date in source `DD/MM/YYYY` form.
    pub date: String,
    /// Balance in whole FCFA.
    pub amount: i64,
}

impl OpeningBalance {
    pub fn new(date: impl Into<String>, amount: i64) -> Self {
        Self {
            date: date.into(),
            amount,
        }
    }

    /// The date in ISO 8601 form, if the source form parses.
    pub fn iso_date(&self) -> Option<String> {
        to_iso_date(&self.date)
    }
}

/// A deposit recorded by the business but not yet credited by the bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Operation date (source form).
    pub date_operation: String,
    /// Value date (source form).
    pub date_valeur: String,
    /// Free-text description.
    pub description: String,
    /// Vendor / counterparty.
    pub vendor: String,
    /// Client the deposit relates to.
    pub client: String,
    /// Amount in whole FCFA.
    pub amount: i64,
}

impl Deposit {
    /// The operation date in ISO 8601 form, if the source form parses.
    pub fn iso_date(&self) -> Option<String> {
        to_iso_date(&self.date_operation)
    }
}

/// An issued check not yet debited by the bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Issue date (source form).
    pub date: String,
    /// Check number as printed.
    pub check_number: String,
    /// Free-text description.
    pub description: String,
    /// Client, when the statement carries one.
    pub client: Option<String>,
    /// Invoice or internal reference, when present.
    pub reference: Option<String>,
    /// Amount in whole FCFA.
    pub amount: i64,
}

impl Check {
    /// The issue date in ISO 8601 form, if the source form parses.
    pub fn iso_date(&self) -> Option<String> {
        to_iso_date(&self.date)
    }
}

/// A bank-authorized credit line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    /// Facility name.
    pub name: String,
    /// Maturity date (source form), when present.
    pub date_echeance: Option<String>,
    /// Authorized limit in whole FCFA.
    pub limit: i64,
    /// Drawn amount in whole FCFA.
    pub used: i64,
    /// Remaining balance in whole FCFA.
    pub balance: i64,
}

/// A payment instrument returned unpaid by the bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpaidItem {
    /// Return date (source form).
    pub date: String,
    /// Instrument reference.
    pub reference: String,
    /// Item kind as printed (e.g. "IMPAYE").
    pub kind: String,
    /// Drawee bank.
    pub bank: String,
    /// Client the item relates to.
    pub client: String,
    /// Free-text description.
    pub description: String,
    /// Amount in whole FCFA.
    pub amount: i64,
}

/// A parsed row, tagged by the section it came from.
///
/// Downstream code matches on the variant instead of guessing a cell shape,
/// so deposit rows can never be read as check rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionRecord {
    OpeningBalance(OpeningBalance),
    Deposit(Deposit),
    Check(Check),
    Facility(Facility),
    Unpaid(UnpaidItem),
    ClosingBalance { amount: i64 },
}

impl SectionRecord {
    /// The section this record belongs to.
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionRecord::OpeningBalance(_) => SectionKind::OpeningBalance,
            SectionRecord::Deposit(_) => SectionKind::Deposits,
            SectionRecord::Check(_) => SectionKind::Checks,
            SectionRecord::Facility(_) => SectionKind::Facilities,
            SectionRecord::Unpaid(_) => SectionKind::Unpaid,
            SectionRecord::ClosingBalance { .. } => SectionKind::ClosingBalance,
        }
    }

    /// The monetary amount carried by this record.
    pub fn amount(&self) -> i64 {
        match self {
            SectionRecord::OpeningBalance(b) => b.amount,
            SectionRecord::Deposit(d) => d.amount,
            SectionRecord::Check(c) => c.amount,
            SectionRecord::Facility(f) => f.used,
            SectionRecord::Unpaid(u) => u.amount,
            SectionRecord::ClosingBalance { amount } => *amount,
        }
    }
}

/// Convert a `DD/MM/YYYY` date to `YYYY-MM-DD`.
pub(crate) fn to_iso_date(source: &str) -> Option<String> {
    NaiveDate::parse_from_str(source.trim(), "%d/%m/%Y")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date_conversion() {
        let balance = OpeningBalance::new("24/06/2025", 78_615_440);
        assert_eq!(balance.iso_date().as_deref(), Some("2025-06-24"));
    }

    #[test]
    fn test_iso_date_rejects_garbage() {
        assert_eq!(to_iso_date("N/A"), None);
        assert_eq!(to_iso_date("31/02/2025"), None);
        assert_eq!(to_iso_date(""), None);
    }

    #[test]
    fn test_section_record_amount() {
        let record = SectionRecord::Check(Check {
            date: "01/06/2025".to_string(),
            check_number: "0004512".to_string(),
            description: "FOURNISSEUR".to_string(),
            client: None,
            reference: None,
            amount: 147_500,
        });
        assert_eq!(record.kind(), SectionKind::Checks);
        assert_eq!(record.amount(), 147_500);
    }
}
