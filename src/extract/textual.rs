//! Textual extraction strategy.
//!
//! Works on joined line text only, with no knowledge of glyph geometry.
//! Robust when the source keeps column order in the text stream, weaker
//! when runs arrive merged or reordered; the orchestrator scores it
//! against the geometric strategy and keeps the better result.

use std::sync::Arc;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{Check, Deposit, OpeningBalance, SectionKind, StatementExtractionResult};
use crate::options::ExtractOptions;
use crate::template::StatementTemplate;

use super::fields::{
    parse_amount, parse_date, parse_facilities, parse_unpaid, split_thirds, trailing_amount,
};
use super::validate::validate;

pub struct TextualExtractor {
    template: Arc<StatementTemplate>,
    options: ExtractOptions,
    deposit_re: Regex,
    check_re: Regex,
    amount_re: Regex,
}

impl TextualExtractor {
    pub fn new(template: Arc<StatementTemplate>, options: ExtractOptions) -> Self {
        TextualExtractor {
            template,
            options,
            // Two dates, free text, then a trailing amount.
            deposit_re: Regex::new(
                r"^(\d{2}/\d{2}/\d{4})\s+(\d{2}/\d{2}/\d{4})\s+(.+?)\s+(\d[\d ]*\d|\d)$",
            )
            .unwrap(),
            // Date, check number, free text, trailing amount, optional unit.
            check_re: Regex::new(
                r"^(\d{2}/\d{2}/\d{4})\s+(\d+)\s+(.+?)\s+(\d[\d ]*\d|\d)\s*(?:FCFA)?$",
            )
            .unwrap(),
            // Thousands-grouped or long plain integer.
            amount_re: Regex::new(r"\d{1,3}(?: \d{3})+|\d{7,}").unwrap(),
        }
    }

    /// Run the textual pass over pre-joined line text, top to bottom.
    pub fn extract(&self, lines: &[String]) -> Result<StatementExtractionResult> {
        let mut result = StatementExtractionResult::default();
        let mut current: Option<SectionKind> = None;
        let mut seen: Vec<SectionKind> = Vec::new();
        let mut facility_lines: Vec<String> = Vec::new();
        let mut unpaid_lines: Vec<String> = Vec::new();

        for line in lines {
            let upper = line.to_uppercase();

            if let Some(kind) = self.section_start(&upper, &seen) {
                match kind {
                    SectionKind::OpeningBalance => self.parse_opening_line(line, &mut result),
                    SectionKind::ClosingBalance => self.parse_closing_line(line, &mut result),
                    // The anchor line can itself be a data row here.
                    SectionKind::Facilities => facility_lines.push(line.clone()),
                    SectionKind::Unpaid => unpaid_lines.push(line.clone()),
                    _ => {}
                }
                seen.push(kind);
                current = Some(kind);
                continue;
            }
            if let Some(kind) = current {
                if self.section_end(kind, &upper) {
                    current = None;
                    continue;
                }
            }
            if self.template.is_denied(&upper) {
                continue;
            }

            match current {
                Some(SectionKind::Deposits) => {
                    if let Some(deposit) = self.parse_deposit_line(line) {
                        result.deposits.push(deposit);
                    }
                }
                Some(SectionKind::Checks) => {
                    if let Some(check) = self.parse_check_line(line) {
                        result.checks.push(check);
                    }
                }
                Some(SectionKind::Facilities) => facility_lines.push(line.clone()),
                Some(SectionKind::Unpaid) => unpaid_lines.push(line.clone()),
                _ => {}
            }
        }

        result.facilities = parse_facilities(&facility_lines);
        result.unpaid_items = parse_unpaid(&unpaid_lines);

        if result.opening_balance.is_none()
            && result.item_count() == 0
            && result.closing_balance == 0
        {
            return Err(Error::Other(
                "textual pass matched no statement structure".into(),
            ));
        }

        result.recompute_totals();
        result.validation = validate(&result, self.options.validation_tolerance);

        if result.opening_balance.is_none() {
            result.warn("opening balance not found in text");
        }
        if result.closing_balance == 0 {
            result.warn("closing balance not found in text");
        }
        for kind in [SectionKind::Deposits, SectionKind::Checks] {
            if !seen.contains(&kind) {
                result.warn(format!("section not found: {}", kind.title()));
            }
        }

        Ok(result)
    }

    fn section_start(&self, upper: &str, seen: &[SectionKind]) -> Option<SectionKind> {
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

    fn section_end(&self, kind: SectionKind, upper: &str) -> bool {
        self.template
            .anchors
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.ends.iter().any(|e| upper.contains(e)))
            .unwrap_or(false)
    }

    fn parse_opening_line(&self, line: &str, result: &mut StatementExtractionResult) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(date) = tokens.iter().find_map(|t| parse_date(t)) else {
            return;
        };
        let amount = trailing_amount(&tokens);
        if amount > 0 {
            result.opening_balance = Some(OpeningBalance::new(date, amount));
        }
    }

    fn parse_closing_line(&self, line: &str, result: &mut StatementExtractionResult) {
        if let Some(m) = self.amount_re.find_iter(line).last() {
            result.closing_balance = parse_amount(m.as_str());
        }
    }

    fn parse_deposit_line(&self, line: &str) -> Option<Deposit> {
        let caps = self.deposit_re.captures(line.trim())?;
        let amount = parse_amount(&caps[4]);
        if amount <= self.options.materiality_floor {
            return None;
        }
        let middle: Vec<&str> = caps[3].split_whitespace().collect();
        let (description, vendor, client) = split_thirds(&middle);
        Some(Deposit {
            date_operation: caps[1].to_string(),
            date_valeur: caps[2].to_string(),
            description,
            vendor,
            client,
            amount,
        })
    }

    fn parse_check_line(&self, line: &str) -> Option<Check> {
        let caps = self.check_re.captures(line.trim())?;
        let amount = parse_amount(&caps[4]);
        if amount <= self.options.materiality_floor {
            return None;
        }
        Some(Check {
            date: caps[1].to_string(),
            check_number: caps[2].to_string(),
            description: caps[3].to_string(),
            client: None,
            reference: None,
            amount,
        })
    }
}
