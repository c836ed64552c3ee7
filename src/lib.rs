//! # releve
//!
//! Structured extraction of financial line items from positioned
//! bank-statement text.
//!
//! The input is page content as positioned text runs (the glyph geometry a
//! PDF text extractor produces); the output is a typed statement: opening
//! and closing balances, uncleared deposits and checks, credit facilities,
//! and unpaid items, cross-checked against the statement's own accounting
//! identity.
//!
//! ## Quick Start
//!
//! ```no_run
//! use releve::{extract_statement, PageContent, TextRun};
//!
//! fn main() -> releve::Result<()> {
//!     let mut page = PageContent::new(595.0, 842.0);
//!     page.push(TextRun::new("OPENING", 40.0, 800.0, 42.0, 9.0));
//!     // ... the rest of the positioned runs ...
//!
//!     let outcome = extract_statement(&[page])?;
//!     println!("closing balance: {}", outcome.result.closing_balance);
//!     println!("{}", outcome.diagnostics.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! ## How it works
//!
//! - **Two strategies**: an order-preserving textual pass and a geometric
//!   pass that rebuilds the table from glyph positions
//! - **Column zones**: calibrated per-bank templates, or deterministic
//!   1-D clustering when no template matches
//! - **Scored arbitration**: both results are compared on item yield and
//!   the accounting identity; the winner ships with a confidence label
//! - **Parallel passes**: the strategies run on separate threads via Rayon

pub mod error;
pub mod extract;
pub mod layout;
pub mod model;
pub mod options;
pub mod template;

// Re-export commonly used types
pub use error::{Error, Result};
pub use extract::{
    extract_statement, ExtractionOutcome, GeometricExtractor, Orchestrator, TextualExtractor,
};
pub use layout::{PageContent, TextRun};
pub use model::{
    Check, Confidence, Deposit, ExtractionDiagnostics, Facility, OpeningBalance, SectionKind,
    SectionRecord, StatementExtractionResult, StrategyKind, StrategyScore, UnpaidItem,
    ValidationSummary,
};
pub use options::ExtractOptions;
pub use template::{StatementTemplate, TemplateRegistry};
