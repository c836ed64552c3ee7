//! Per-section field parsers and the shared amount/date primitives.
//!
//! The parsers work on line text so both extraction strategies can share
//! them; only the deposit parser has an additional cell-based pass that
//! uses the column assignment produced by the layout engine.

use crate::layout::Row;
use crate::model::{Check, Deposit, Facility, OpeningBalance, UnpaidItem};

/// Lines carrying this marker undo an earlier unpaid item and must not be
/// counted again.
const REGULARIZATION_MARKER: &str = "REGULARISATION";
/// Currency-unit suffix printed after some amounts.
const CURRENCY_SUFFIX: &str = "FCFA";

/// Parse a monetary amount from digits-and-spaces text.
///
/// Everything except digits is stripped (thousands groups are separated by
/// spaces on these statements) and the rest parses as an integer. Invalid
/// or empty input yields 0.
pub fn parse_amount(text: &str) -> i64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Validate and return a `DD/MM/YYYY` date token in source form.
pub fn parse_date(token: &str) -> Option<String> {
    let token = token.trim();
    let bytes = token.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'/' || bytes[5] != b'/' {
        return None;
    }
    let digits_ok = token
        .char_indices()
        .all(|(i, c)| if i == 2 || i == 5 { c == '/' } else { c.is_ascii_digit() });
    if !digits_ok {
        return None;
    }
    let day: u32 = token[0..2].parse().ok()?;
    let month: u32 = token[3..5].parse().ok()?;
    if day == 0 || day > 31 || month == 0 || month > 12 {
        return None;
    }
    Some(token.to_string())
}

/// The last maximal run of all-digit tokens in a line, concatenated.
///
/// This is the amount position in balance lines: trailing non-digit tokens
/// (a currency suffix) are skipped first, so
/// "C=(A-B) 81 330 157 FCFA" yields 81330157.
pub fn trailing_amount(tokens: &[&str]) -> i64 {
    let mut end = tokens.len();
    while end > 0 && !is_digit_token(tokens[end - 1]) {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && is_digit_token(tokens[start - 1]) {
        start -= 1;
    }
    if start == end {
        return 0;
    }
    parse_amount(&tokens[start..end].join(" "))
}

fn is_digit_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Start of the trailing digit-token run (the amount group) in a line.
fn amount_group_start(tokens: &[&str]) -> usize {
    let mut end = tokens.len();
    while end > 0 && !is_digit_token(tokens[end - 1]) {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && is_digit_token(tokens[start - 1]) {
        start -= 1;
    }
    start
}

/// Parse the opening balance: the first line carrying a date and a
/// trailing amount.
pub fn parse_opening(lines: &[String]) -> Option<OpeningBalance> {
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(date) = tokens.iter().find_map(|t| parse_date(t)) else {
            continue;
        };
        let amount = trailing_amount(&tokens);
        if amount > 0 {
            return Some(OpeningBalance::new(date, amount));
        }
    }
    None
}

/// Parse the declared closing balance: the last run of digit tokens on the
/// first line that has one, skipping a trailing currency token, so
/// `"... C=(A-B) 81 330 157 FCFA"` yields 81330157.
pub fn parse_closing(lines: &[String]) -> Option<i64> {
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let amount = trailing_amount(&tokens);
        if amount > 0 {
            return Some(amount);
        }
    }
    None
}

/// Parse deposit rows from assigned cells.
///
/// Wants at least six cells per row: two dates, the free-text
/// description/vendor/client cells, and a trailing amount. Rows that do
/// not fit the shape are skipped; when nothing fits, callers fall back to
/// [`parse_deposit_lines`].
pub fn parse_deposit_cells(rows: &[Row], floor: i64) -> Vec<Deposit> {
    let mut deposits = Vec::new();

    for row in rows {
        if row.cell_count() < 6 {
            continue;
        }
        let (Some(date_operation), Some(date_valeur)) =
            (parse_date(&row.cell_text(0)), parse_date(&row.cell_text(1)))
        else {
            continue;
        };
        let amount = parse_amount(&row.cell_text(5));
        if amount <= floor {
            continue;
        }
        deposits.push(Deposit {
            date_operation,
            date_valeur,
            description: row.cell_text(2),
            vendor: row.cell_text(3),
            client: row.cell_text(4),
            amount,
        });
    }

    deposits
}

/// Token-level deposit fallback: two consecutive date tokens mark a row,
/// the trailing digit group is the amount, and the middle tokens split
/// proportionally into description, vendor, and client.
pub fn parse_deposit_lines(lines: &[String], floor: i64) -> Vec<Deposit> {
    let mut deposits = Vec::new();

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let Some(pos) = tokens
            .windows(2)
            .position(|w| parse_date(w[0]).is_some() && parse_date(w[1]).is_some())
        else {
            continue;
        };

        let amount = trailing_amount(&tokens);
        if amount <= floor {
            continue;
        }

        let middle_end = amount_group_start(&tokens).max(pos + 2);
        let (description, vendor, client) = split_thirds(&tokens[pos + 2..middle_end]);

        deposits.push(Deposit {
            date_operation: tokens[pos].to_string(),
            date_valeur: tokens[pos + 1].to_string(),
            description,
            vendor,
            client,
            amount,
        });
    }

    deposits
}

/// Split free-text tokens into three roughly equal parts.
pub(crate) fn split_thirds(tokens: &[&str]) -> (String, String, String) {
    if tokens.is_empty() {
        return (String::new(), String::new(), String::new());
    }
    let third = tokens.len().div_ceil(3);
    let first = tokens[..third.min(tokens.len())].join(" ");
    let second = tokens
        .get(third..(third * 2).min(tokens.len()))
        .unwrap_or(&[])
        .join(" ");
    let rest = tokens.get(third * 2..).unwrap_or(&[]).join(" ");
    (first, second, rest)
}

/// Parse check rows: date, check number, description, optional invoice
/// reference, trailing amount.
pub fn parse_checks(lines: &[String], floor: i64) -> Vec<Check> {
    let mut checks = Vec::new();

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let Some(date_pos) = tokens.iter().position(|t| parse_date(t).is_some()) else {
            continue;
        };
        let date = tokens[date_pos].to_string();

        // The check number is the first plain integer after the date.
        let Some(number_pos) = (date_pos + 1..tokens.len()).find(|&i| is_digit_token(tokens[i]))
        else {
            continue;
        };
        let check_number = tokens[number_pos].to_string();

        let (amount, reference, desc_end) = resolve_check_amount(&tokens, number_pos + 1);
        if amount <= floor {
            continue;
        }

        let description = tokens[number_pos + 1..desc_end.max(number_pos + 1)].join(" ");

        checks.push(Check {
            date,
            check_number,
            description,
            client: None,
            reference,
            amount,
        });
    }

    checks
}

/// Decide which trailing numeric tokens are the check amount.
///
/// With an explicit currency suffix the amount is the digit run immediately
/// before it. Otherwise a long (>= 6 digit) token in the trailing run is an
/// invoice reference, kept separate, and the remaining shorter tokens
/// concatenate into the amount.
fn resolve_check_amount(tokens: &[&str], search_from: usize) -> (i64, Option<String>, usize) {
    if let Some(fcfa_pos) = tokens[search_from..]
        .iter()
        .position(|t| t.eq_ignore_ascii_case(CURRENCY_SUFFIX))
        .map(|p| p + search_from)
    {
        let mut start = fcfa_pos;
        while start > search_from && is_digit_token(tokens[start - 1]) {
            start -= 1;
        }
        let amount = parse_amount(&tokens[start..fcfa_pos].join(" "));
        return (amount, None, start);
    }

    let mut start = tokens.len();
    while start > search_from && is_digit_token(tokens[start - 1]) {
        start -= 1;
    }
    let trailing = &tokens[start..];
    if trailing.is_empty() {
        return (0, None, tokens.len());
    }

    let long_pos = trailing.iter().position(|t| t.len() >= 6);
    match long_pos {
        Some(p) if trailing.len() > 1 => {
            let reference = trailing[p].to_string();
            let rest: Vec<&str> = trailing
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != p)
                .map(|(_, t)| *t)
                .collect();
            let amount = parse_amount(&rest.join(" "));
            if amount > 0 {
                (amount, Some(reference), start)
            } else {
                (parse_amount(&reference), None, start)
            }
        }
        _ => (parse_amount(&trailing.join(" ")), None, start),
    }
}

/// Parse facility rows: `[optional date] name limit used balance`.
///
/// A totals row has the same three-numeric-group shape without a name and
/// is excluded from the item list.
pub fn parse_facilities(lines: &[String]) -> Vec<Facility> {
    let mut facilities = Vec::new();

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let mut date_echeance = None;
        let mut name_tokens: Vec<&str> = Vec::new();
        let mut numeric: Vec<&str> = Vec::new();

        for token in &tokens {
            if date_echeance.is_none() && name_tokens.is_empty() {
                if let Some(date) = parse_date(token) {
                    date_echeance = Some(date);
                    continue;
                }
            }
            if is_digit_token(token) {
                numeric.push(token);
            } else {
                name_tokens.push(token);
            }
        }

        let groups = group_numeric_tokens(&numeric);
        if groups.len() != 3 {
            continue;
        }
        if name_tokens.is_empty() {
            // Totals row: three numeric groups, no name.
            continue;
        }

        facilities.push(Facility {
            name: name_tokens.join(" "),
            date_echeance,
            limit: groups[0],
            used: groups[1],
            balance: groups[2],
        });
    }

    facilities
}

/// Group digit tokens into amounts: a token of exactly three digits
/// continues the current thousands group, anything else starts a new one.
fn group_numeric_tokens(tokens: &[&str]) -> Vec<i64> {
    let mut groups: Vec<String> = Vec::new();
    for token in tokens {
        match groups.last_mut() {
            Some(current) if token.len() == 3 => {
                current.push(' ');
                current.push_str(token);
            }
            _ => groups.push(token.to_string()),
        }
    }
    groups.iter().map(|g| parse_amount(g)).collect()
}

/// Parse unpaid rows: `date reference IMPAYE bank client description amount`.
///
/// Regularization lines are excluded so the same item is not counted twice.
pub fn parse_unpaid(lines: &[String]) -> Vec<UnpaidItem> {
    let mut items = Vec::new();

    for line in lines {
        let upper = line.to_uppercase();
        if upper.contains(REGULARIZATION_MARKER) {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(date_pos) = tokens.iter().position(|t| parse_date(t).is_some()) else {
            continue;
        };
        let Some(kind_pos) = tokens.iter().position(|t| t.to_uppercase().contains("IMPAYE"))
        else {
            continue;
        };
        if kind_pos <= date_pos + 1 || tokens.len() < kind_pos + 4 {
            continue;
        }

        let amount = trailing_amount(&tokens);
        if amount == 0 {
            continue;
        }

        let desc_end = amount_group_start(&tokens);

        items.push(UnpaidItem {
            date: tokens[date_pos].to_string(),
            reference: tokens[date_pos + 1..kind_pos].join(" "),
            kind: tokens[kind_pos].to_string(),
            bank: tokens.get(kind_pos + 1).unwrap_or(&"").to_string(),
            client: tokens.get(kind_pos + 2).unwrap_or(&"").to_string(),
            description: tokens[(kind_pos + 3).min(desc_end)..desc_end].join(" "),
            amount,
        });
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_parse_amount_round_trips() {
        assert_eq!(parse_amount("3 000 000"), 3_000_000);
        assert_eq!(parse_amount("147 500"), 147_500);
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("N/A"), 0);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("24/06/2025").as_deref(), Some("24/06/2025"));
        assert_eq!(parse_date("2025-06-24"), None);
        assert_eq!(parse_date("32/06/2025"), None);
        assert_eq!(parse_date("10/13/2025"), None);
        assert_eq!(parse_date("100302"), None);
    }

    #[test]
    fn test_trailing_amount_stops_at_non_digit() {
        let tokens: Vec<&str> = "CLOSING BALANCE as per Book : C=(A-B) 81 330 157 FCFA"
            .split_whitespace()
            .collect();
        assert_eq!(trailing_amount(&tokens), 81_330_157);
    }

    #[test]
    fn test_parse_opening_scenario() {
        let opening =
            parse_opening(&lines(&["OPENING BALANCE 24/06/2025 78 615 440"])).unwrap();
        assert_eq!(opening.date, "24/06/2025");
        assert_eq!(opening.amount, 78_615_440);
    }

    #[test]
    fn test_parse_opening_missing() {
        assert!(parse_opening(&lines(&["OPENING BALANCE"])).is_none());
    }

    #[test]
    fn test_parse_closing_with_unit_suffix() {
        let closing =
            parse_closing(&lines(&["CLOSING BALANCE as per Book : C=(A-B) 81 330 157 FCFA"]));
        assert_eq!(closing, Some(81_330_157));
    }

    #[test]
    fn test_parse_deposit_lines() {
        let deposits = parse_deposit_lines(
            &lines(&[
                "02/06/2025 03/06/2025 REMISE CHEQUE ACME CLIENTA 2 500 000",
                "04/06/2025 05/06/2025 VIREMENT RECU BETA CLIENTB 1 200 000",
            ]),
            500,
        );
        assert_eq!(deposits.len(), 2);
        assert_eq!(deposits[0].date_operation, "02/06/2025");
        assert_eq!(deposits[0].date_valeur, "03/06/2025");
        assert_eq!(deposits[0].amount, 2_500_000);
        assert!(!deposits[0].description.is_empty());
        assert_eq!(deposits[1].amount, 1_200_000);
    }

    #[test]
    fn test_parse_checks_basic() {
        let checks = parse_checks(
            &lines(&["05/06/2025 0004512 FOURNISSEUR BUREAU 147 500"]),
            500,
        );
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].check_number, "0004512");
        assert_eq!(checks[0].amount, 147_500);
        assert_eq!(checks[0].reference, None);
        assert!(checks[0].description.contains("FOURNISSEUR"));
    }

    #[test]
    fn test_parse_checks_currency_suffix_rule() {
        let checks = parse_checks(&lines(&["05/06/2025 0004512 LOYER JUIN 850 000 FCFA"]), 500);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].amount, 850_000);
        assert!(checks[0].description.contains("LOYER"));
    }

    #[test]
    fn test_parse_checks_invoice_reference_heuristic() {
        // "100302" is a six-digit invoice reference and "870" the amount;
        // they must not concatenate into a nine-digit amount.
        let checks = parse_checks(
            &lines(&["05/06/2025 0004513 FACTURE DIVERS 100302 870"]),
            500,
        );
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].reference.as_deref(), Some("100302"));
        assert_eq!(checks[0].amount, 870);
    }

    #[test]
    fn test_parse_facilities_with_totals_row() {
        let facilities = parse_facilities(&lines(&[
            "ESCOMPTE 5000000 2000000 3000000",
            "31/12/2025 DECOUVERT 10000000 4000000 6000000",
            "15000000 6000000 9000000",
        ]));
        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].name, "ESCOMPTE");
        assert_eq!(facilities[0].limit, 5_000_000);
        assert_eq!(facilities[0].used, 2_000_000);
        assert_eq!(facilities[0].balance, 3_000_000);
        assert_eq!(facilities[1].date_echeance.as_deref(), Some("31/12/2025"));
        assert_eq!(facilities[1].name, "DECOUVERT");
    }

    #[test]
    fn test_parse_facilities_spaced_amounts() {
        let facilities =
            parse_facilities(&lines(&["ESCOMPTE 5 000 000 2 000 000 3 000 000"]));
        assert_eq!(facilities.len(), 1);
        assert_eq!(facilities[0].limit, 5_000_000);
        assert_eq!(facilities[0].used, 2_000_000);
        assert_eq!(facilities[0].balance, 3_000_000);
    }

    #[test]
    fn test_parse_unpaid_excludes_regularization() {
        let items = parse_unpaid(&lines(&[
            "10/06/2025 889900 IMPAYE BICICI CLIENTX LOYER JUIN 250 000",
            "12/06/2025 889900 REGULARISATION IMPAYE BICICI CLIENTX LOYER 250 000",
        ]));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].reference, "889900");
        assert_eq!(items[0].bank, "BICICI");
        assert_eq!(items[0].client, "CLIENTX");
        assert_eq!(items[0].amount, 250_000);
    }
}
