//! Typed statement model.
//!
//! This module defines the records produced by extraction and the aggregate
//! result returned to callers. All types are plain data with serde derives
//! so persistence and UI layers can consume them without touching the
//! extraction pipeline.

mod record;
mod result;

pub use record::{
    Check, Deposit, Facility, OpeningBalance, SectionKind, SectionRecord, UnpaidItem,
};
pub use result::{
    Confidence, ExtractionDiagnostics, StatementExtractionResult, StrategyKind, StrategyScore,
    ValidationSummary,
};
