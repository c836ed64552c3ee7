//! Statement templates and the document-type detector.
//!
//! A template bundles everything bank-specific: the calibrated zone table at
//! a reference page width, the section anchor vocabulary, the noise denylist
//! and the detector phrases. Templates live in an open registry so adding a
//! bank means registering one value, not threading new string checks through
//! the parsers.

use std::sync::Arc;

use crate::layout::{Alignment, ContentKind, ZoneModel, ZoneSpec};
use crate::model::SectionKind;

/// A start or end anchor for one section.
#[derive(Debug, Clone)]
pub struct SectionAnchor {
    /// Section opened (or closed) by the anchor.
    pub kind: SectionKind,
    /// Case-insensitive substrings that open the section.
    pub starts: &'static [&'static str],
    /// Case-insensitive substrings that close it, besides the next start.
    pub ends: &'static [&'static str],
}

/// A bank-specific statement template.
#[derive(Debug, Clone)]
pub struct StatementTemplate {
    /// Stable identifier, e.g. "fcfa-bank-v1".
    pub id: &'static str,
    /// Page width the zone table was calibrated at.
    pub reference_width: f32,
    /// Calibrated zone table.
    pub zones: Vec<ZoneSpec>,
    /// Phrases counted by the document-type detector.
    pub detector_phrases: &'static [&'static str],
    /// Section anchor vocabulary.
    pub anchors: Vec<SectionAnchor>,
    /// Lines matching any of these substrings never reach column
    /// distribution (totals, headers, known noise).
    pub denylist: &'static [&'static str],
}

impl StatementTemplate {
    /// Count how many detector phrases appear in the document text.
    pub fn detector_score(&self, text: &str) -> usize {
        let upper = text.to_uppercase();
        self.detector_phrases
            .iter()
            .filter(|phrase| upper.contains(&phrase.to_uppercase()))
            .count()
    }

    /// Scale the calibrated zone table to the observed page width.
    pub fn zone_model(&self, page_width: f32) -> ZoneModel {
        ZoneModel::calibrated(self.id, &self.zones, self.reference_width, page_width)
    }

    /// Whether a line matches the denylist.
    pub fn is_denied(&self, line: &str) -> bool {
        let upper = line.to_uppercase();
        self.denylist.iter().any(|d| upper.contains(d))
    }

    /// Index of the amount zone in the calibrated table.
    pub fn amount_zone_index(&self) -> Option<usize> {
        self.zones
            .iter()
            .position(|z| z.content == ContentKind::Amount)
    }
}

/// Registry of statement templates, looked up by detector score.
#[derive(Clone)]
pub struct TemplateRegistry {
    templates: Vec<Arc<StatementTemplate>>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    /// Create a registry preloaded with the built-in templates.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(fcfa_bank_v1()));
        registry
    }

    /// Register a template.
    pub fn register(&mut self, template: Arc<StatementTemplate>) {
        self.templates.push(template);
    }

    /// Look up a template by identifier.
    pub fn get(&self, id: &str) -> Option<Arc<StatementTemplate>> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }

    /// Look up a template by identifier, erroring when it is not registered.
    pub fn require(&self, id: &str) -> crate::Result<Arc<StatementTemplate>> {
        self.get(id)
            .ok_or_else(|| crate::Error::UnknownTemplate(id.to_string()))
    }

    /// Detect the best-matching template for the document text.
    ///
    /// Returns the highest-scoring template whose score reaches `threshold`;
    /// `None` means the caller should fall back to adaptive clustering.
    pub fn detect(&self, text: &str, threshold: usize) -> Option<Arc<StatementTemplate>> {
        let best = self
            .templates
            .iter()
            .map(|t| (t.detector_score(text), t))
            .max_by_key(|(score, _)| *score)?;

        if best.0 >= threshold {
            log::debug!(
                "TemplateRegistry: matched '{}' with score {}",
                best.1.id,
                best.0
            );
            Some(best.1.clone())
        } else {
            log::debug!(
                "TemplateRegistry: best score {} below threshold {}, using adaptive zones",
                best.0,
                threshold
            );
            None
        }
    }

    /// Registered template count.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// The built-in FCFA bank-statement template, calibrated at A4 width.
pub fn fcfa_bank_v1() -> StatementTemplate {
    StatementTemplate {
        id: "fcfa-bank-v1",
        reference_width: 595.0,
        zones: vec![
            ZoneSpec {
                name: "date_operation",
                x_min: 40.0,
                x_max: 110.0,
                alignment: Alignment::Left,
                content: ContentKind::Date,
            },
            ZoneSpec {
                name: "date_valeur",
                x_min: 110.0,
                x_max: 180.0,
                alignment: Alignment::Left,
                content: ContentKind::Date,
            },
            ZoneSpec {
                name: "description",
                x_min: 180.0,
                x_max: 330.0,
                alignment: Alignment::Left,
                content: ContentKind::Text,
            },
            ZoneSpec {
                name: "vendor",
                x_min: 330.0,
                x_max: 410.0,
                alignment: Alignment::Left,
                content: ContentKind::Text,
            },
            ZoneSpec {
                name: "client",
                x_min: 410.0,
                x_max: 470.0,
                alignment: Alignment::Left,
                content: ContentKind::Text,
            },
            ZoneSpec {
                name: "amount",
                x_min: 470.0,
                x_max: 560.0,
                alignment: Alignment::Right,
                content: ContentKind::Amount,
            },
        ],
        detector_phrases: &[
            "OPENING BALANCE",
            "CLOSING BALANCE",
            "DEPOSIT NOT YET CLEARED",
            "CHECK NOT YET CLEARED",
            "BANK FACILITY",
            "FCFA",
        ],
        anchors: vec![
            SectionAnchor {
                kind: SectionKind::OpeningBalance,
                starts: &["OPENING BALANCE"],
                ends: &[],
            },
            SectionAnchor {
                kind: SectionKind::Deposits,
                starts: &["ADD : DEPOSIT NOT YET CLEARED", "DEPOSIT NOT YET CLEARED"],
                ends: &["TOTAL DEPOSIT"],
            },
            SectionAnchor {
                kind: SectionKind::Checks,
                starts: &["LESS : CHECK NOT YET CLEARED", "CHECK NOT YET CLEARED"],
                ends: &["TOTAL (B)"],
            },
            SectionAnchor {
                kind: SectionKind::Facilities,
                starts: &["BANK FACILITY"],
                ends: &[],
            },
            SectionAnchor {
                kind: SectionKind::Unpaid,
                starts: &["IMPAYE"],
                ends: &[],
            },
            SectionAnchor {
                kind: SectionKind::ClosingBalance,
                starts: &["CLOSING BALANCE"],
                ends: &[],
            },
        ],
        denylist: &[
            "TOTAL DEPOSIT",
            "TOTAL (A)",
            "TOTAL (B)",
            "TOTAL FACILITY",
            "DATE OPERATION",
            "DATE VALEUR",
            "LIBELLE",
            "MONTANT",
            "PAGE ",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_score() {
        let template = fcfa_bank_v1();
        let text = "OPENING BALANCE 24/06/2025\nADD : DEPOSIT NOT YET CLEARED\n\
                    CLOSING BALANCE as per Book 81 330 157 FCFA";
        assert_eq!(template.detector_score(text), 4);
        assert_eq!(template.detector_score("unrelated invoice"), 0);
    }

    #[test]
    fn test_registry_detect_threshold() {
        let registry = TemplateRegistry::with_builtins();
        let matching = "OPENING BALANCE ... CLOSING BALANCE ... 1 000 FCFA";
        assert!(registry.detect(matching, 3).is_some());
        assert!(registry.detect(matching, 4).is_none());
        assert!(registry.detect("plain text", 3).is_none());
    }

    #[test]
    fn test_registry_open_for_extension() {
        let mut registry = TemplateRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(fcfa_bank_v1()));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("fcfa-bank-v1").is_some());
        assert!(registry.get("unknown").is_none());
        assert!(matches!(
            registry.require("unknown"),
            Err(crate::Error::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_denylist() {
        let template = fcfa_bank_v1();
        assert!(template.is_denied("TOTAL DEPOSIT (A) 12 000 000"));
        assert!(template.is_denied("DATE OPERATION  DATE VALEUR"));
        assert!(!template.is_denied("REMISE CHEQUE CLIENT X"));
    }

    #[test]
    fn test_zone_table_ordered_and_disjoint() {
        let template = fcfa_bank_v1();
        let model = template.zone_model(595.0);
        for pair in model.zones.windows(2) {
            assert!(pair[0].x_end <= pair[1].x_start);
        }
        assert_eq!(template.amount_zone_index(), Some(5));
    }
}
