//! Bank statement heuristics.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{account_number, alpha_words, clean_person_name, parse_amount, parse_date};
use crate::models::{text_lines, BankStatement, Transaction};

const NAME_STOP_WORDS: &[&str] = &[
    "opening", "state", "branch", "bank", "acc", "account", "a", "c", "number", "no", "customer",
    "cust", "id", "ifsc", "address", "statement", "period", "date", "cif",
];

const TABULAR_CREDIT_MARKERS: &[&str] = &["CR", "CREDIT", "NEFT", "UPI", "SALARY"];
const LOOSE_CREDIT_MARKERS: &[&str] = &["CR", "CREDIT", "SAL", "NEFT"];
const DEBIT_MARKERS: &[&str] = &["DR", "DEBIT", "DEBITED", "WITHDRAWAL"];

static HOLDER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)account\s*holder(?:'s)?(?:\s*name)?\s*[:\-]?\s*(.+)",
        r"(?i)customer\s*name\s*[:\-]?\s*(.+)",
        r"(?i)\bname\s*[:\-]\s*(.+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static HONORIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:MR|MRS|MS|SHRI|SMT)\.?\s+([A-Za-z][A-Za-z\s]{2,50})").unwrap()
});

static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b").unwrap());

static ANY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b").unwrap());

static LOOSE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9][0-9,]*\.\d{2}(?:\s*(?i:cr|dr)\b)?").unwrap());

static PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    const DATE: &str = r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{1,2}[\s\-][A-Za-z]{3,9}[\s\-]\d{4})";
    Regex::new(&format!(
        r"(?i)(?:period|from)\s*:?\s*(?:from\s*)?{}\s*(?:to|-)\s*{}",
        DATE, DATE
    ))
    .unwrap()
});

static IFSC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{4}0[A-Z0-9]{6})\b").unwrap());

pub fn parse(text: &str) -> BankStatement {
    let lines = text_lines(text);
    let (period_from, period_to) = match PERIOD.captures(text) {
        Some(caps) => (Some(parse_date(&caps[1])), Some(parse_date(&caps[2]))),
        None => (None, None),
    };

    BankStatement {
        account_holder_name: holder_name(&lines),
        account_number: account_number(text),
        bank_name: bank_name(&lines),
        ifsc: IFSC.captures(&text.to_uppercase()).map(|c| c[1].to_string()),
        period_from,
        period_to,
        transactions: transactions(&lines),
        ..Default::default()
    }
}

fn holder_name(lines: &[&str]) -> Option<String> {
    for re in HOLDER_PATTERNS.iter() {
        for line in lines {
            if let Some(caps) = re.captures(line) {
                if let Some(name) = clean_person_name(&caps[1], NAME_STOP_WORDS, 4) {
                    return Some(name);
                }
            }
        }
    }

    lines.iter().find_map(|line| {
        let caps = HONORIFIC.captures(line)?;
        clean_person_name(&caps[1], NAME_STOP_WORDS, 4)
    })
}

fn bank_name(lines: &[&str]) -> Option<String> {
    lines.iter().take(8).find_map(|line| {
        let lower = line.to_lowercase();
        if let Some(idx) = lower.find("bank name") {
            let value = line.get(idx + "bank name".len()..)?;
            let value = value.trim_start_matches([':', '-', ' ']).trim();
            return (!value.is_empty()).then(|| value.to_string());
        }
        let words = alpha_words(&lower);
        let is_bank = words.contains(&"bank")
            && !words
                .iter()
                .any(|w| matches!(*w, "statement" | "account" | "details" | "summary"));
        is_bank.then(|| line.trim().to_string())
    })
}

/// Tabular rows first; if none match, fall back to loose rows.
pub fn transactions(lines: &[&str]) -> Vec<Transaction> {
    let tabular = tabular_transactions(lines);
    if !tabular.is_empty() {
        return tabular;
    }
    loose_transactions(lines)
}

fn upper_tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_uppercase())
        .collect()
}

fn has_marker(tokens: &[String], markers: &[&str]) -> bool {
    tokens
        .iter()
        .any(|t| markers.iter().any(|m| t.starts_with(m)))
}

/// Debit markers on the amount win over any credit marker in the text.
fn classify(amount_token: &str, description: &str, credit_markers: &[&str]) -> (f64, bool) {
    let raw = parse_amount(amount_token).unwrap_or(0.0);
    let lower = amount_token.trim().to_lowercase();
    let tokens = upper_tokens(description);

    let debit = raw < 0.0
        || lower.ends_with("dr")
        || tokens.iter().any(|t| DEBIT_MARKERS.contains(&t.as_str()));
    let credit = !debit && (lower.ends_with("cr") || has_marker(&tokens, credit_markers));
    (raw.abs(), credit)
}

/// Rows that start with a date and end with an amount.
fn tabular_transactions(lines: &[&str]) -> Vec<Transaction> {
    let mut out = Vec::new();
    for line in lines {
        let Some(caps) = LEADING_DATE.captures(line) else {
            continue;
        };
        let mut parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }

        let mut amount_token = parts.pop().unwrap_or_default().to_string();
        if matches!(amount_token.to_uppercase().as_str(), "CR" | "DR") && parts.len() >= 3 {
            let marker = amount_token;
            amount_token = format!("{}{}", parts.pop().unwrap_or_default(), marker);
        }
        if parse_amount(&amount_token).is_none() {
            continue;
        }

        let description = parts[1..].join(" ");
        let (amount, is_credit) = classify(&amount_token, &description, TABULAR_CREDIT_MARKERS);
        if amount == 0.0 {
            continue;
        }

        out.push(Transaction {
            date: parse_date(&caps[1]),
            description,
            amount,
            is_credit,
        });
    }
    out
}

/// Rows with a date anywhere and at least one `N,NNN.NN` amount; the last
/// amount on the line is taken.
fn loose_transactions(lines: &[&str]) -> Vec<Transaction> {
    let mut out = Vec::new();
    for line in lines {
        let Some(date) = ANY_DATE.find(line) else {
            continue;
        };
        let Some(amount) = LOOSE_AMOUNT.find_iter(line).last() else {
            continue;
        };

        let description = format!("{}{}", &line[..amount.start()], &line[amount.end()..])
            .replacen(date.as_str(), "", 1)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let (value, is_credit) = classify(amount.as_str(), &description, LOOSE_CREDIT_MARKERS);
        if value == 0.0 {
            continue;
        }

        out.push(Transaction {
            date: parse_date(date.as_str()),
            description,
            amount: value,
            is_credit,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const STATEMENT: &str = "HDFC Bank Ltd
Account Statement
Account Holder: John Doe
Account Number: 1234567890
IFSC: HDFC0001234
Statement Period: 01/10/2025 to 31/10/2025
15/10/2025  SALARY CREDIT           50,000.00
20/10/2025  UPI PAYMENT             -500.00";

    #[test]
    fn test_parse_statement_header() {
        let stmt = parse(STATEMENT);
        assert_eq!(stmt.account_holder_name.as_deref(), Some("John Doe"));
        assert_eq!(stmt.account_number.as_deref(), Some("1234567890"));
        assert_eq!(stmt.bank_name.as_deref(), Some("HDFC Bank Ltd"));
        assert_eq!(stmt.ifsc.as_deref(), Some("HDFC0001234"));
        assert_eq!(
            stmt.period_from.and_then(|d| d.date),
            NaiveDate::from_ymd_opt(2025, 10, 1)
        );
    }

    #[test]
    fn test_tabular_transactions_keep_debits() {
        let stmt = parse(STATEMENT);
        assert_eq!(stmt.transactions.len(), 2);

        let salary = &stmt.transactions[0];
        assert_eq!(salary.amount, 50000.0);
        assert!(salary.is_credit);
        assert_eq!(salary.description, "SALARY CREDIT");
        assert_eq!(salary.date.date, NaiveDate::from_ymd_opt(2025, 10, 15));

        let upi = &stmt.transactions[1];
        assert_eq!(upi.amount, 500.0);
        assert!(!upi.is_credit);
    }

    #[test]
    fn test_separate_cr_dr_column() {
        let lines = ["01/11/2025 NEFT ACME PAYROLL 45,000.00 Cr", "02/11/2025 ATM CASH 2,000.00 Dr"];
        let txs = transactions(&lines);
        assert_eq!(txs.len(), 2);
        assert!(txs[0].is_credit);
        assert_eq!(txs[0].amount, 45000.0);
        assert!(!txs[1].is_credit);
    }

    #[test]
    fn test_loose_transactions() {
        let lines = ["Txn on 05/10/2025 by NEFT-SAL ACME 60,000.00 balance", "random line"];
        let txs = transactions(&lines);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount, 60000.0);
        assert!(txs[0].is_credit);
        assert_eq!(txs[0].description, "Txn on by NEFT-SAL ACME balance");
    }

    #[test]
    fn test_zero_amount_rows_skipped() {
        let lines = ["01/10/2025 OPENING BALANCE 0.00"];
        assert!(transactions(&lines).is_empty());
    }

    #[test]
    fn test_honorific_holder() {
        let stmt = parse("Statement of account\nMR AASHISH RAWAT\n12 MG Road");
        assert_eq!(stmt.account_holder_name.as_deref(), Some("AASHISH RAWAT"));
    }
}
