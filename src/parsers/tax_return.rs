//! Income tax return (ITR-V / acknowledgement) heuristics.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{number_under_label, pan, parse_amount, parse_date};
use crate::models::{text_lines, RecognizedDate, TaxReturn};

/// Keywords that indicate a readable tax-return text layer.
const TAX_KEYWORDS: &[&str] = &[
    "income", "tax", "pan", "assessment", "return", "total", "taxable", "refund", "filing",
];

/// Lines that follow a bare "Name" label but are section headers.
const SECTION_WORDS: &[&str] = &["address", "status", "individual", "form number", "form", "itr"];

static ASSESSMENT_YEAR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2,4}$").unwrap());

static ASSESSMENT_YEAR: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)assessment\s*year[:\s]*(\d{4}-\d{2,4})",
        r"(?i)\bA\.?Y\.?[:\s]*(\d{4}-\d{2,4})",
        r"\b(\d{4}-\d{2})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

fn amount_patterns(labels: &[&str]) -> Vec<Regex> {
    labels
        .iter()
        .map(|label| {
            Regex::new(&format!(
                r"(?i){}[:\s]*(?:rs\.?|inr|₹)?\s*([0-9,]+(?:\.\d+)?)",
                label
            ))
            .unwrap()
        })
        .collect()
}

static TOTAL_INCOME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    amount_patterns(&[
        r"total\s*income",
        r"gross\s*total\s*income",
        r"income\s*under\s*all\s*heads",
    ])
});

static TAX_PAID: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    amount_patterns(&[
        r"tax\s*paid",
        r"total\s*tax\s*paid",
        r"taxes\s*paid",
        r"tax\s*liability",
    ])
});

static FILING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{2})[-/](\d{2})[-/](\d{4})\b").unwrap());

static SIGNED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?$").unwrap());

/// Text-layer quality score in [0, 100]: length band plus keyword hits.
pub fn text_quality_score(text: &str) -> f64 {
    let len = text.trim().chars().count();
    let mut score: f64 = if len > 500 {
        40.0
    } else if len > 100 {
        20.0
    } else if len > 20 {
        10.0
    } else {
        0.0
    };

    let lower = text.to_lowercase();
    let hits = TAX_KEYWORDS.iter().filter(|k| lower.contains(*k)).count();
    score += hits as f64 * 6.67;
    score.min(100.0)
}

pub fn parse(text: &str) -> TaxReturn {
    let lines = text_lines(text);
    TaxReturn {
        pan: pan(text),
        name: name(&lines),
        assessment_year: assessment_year(&lines, text),
        total_income: number_under_label(&lines, "Total Income")
            .filter(|v| *v > 0.0)
            .or_else(|| first_amount(&TOTAL_INCOME, text)),
        tax_paid: number_under_label(&lines, "Taxes Paid")
            .filter(|v| *v > 0.0)
            .or_else(|| first_amount(&TAX_PAID, text)),
        refund_amount: refund(&lines),
        filing_date: filing_date(&lines),
        ..Default::default()
    }
}

fn clean_label(s: &str) -> String {
    s.replace(':', "").trim().to_string()
}

fn first_amount(patterns: &[Regex], text: &str) -> Option<f64> {
    patterns.iter().find_map(|re| {
        re.captures_iter(text)
            .find_map(|caps| parse_amount(&caps[1]).filter(|v| *v > 0.0))
    })
}

fn assessment_year(lines: &[&str], text: &str) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        if !line.to_lowercase().contains("assessment year") {
            continue;
        }
        let found = lines
            .iter()
            .skip(i + 1)
            .take(3)
            .map(|l| clean_label(l))
            .find(|c| ASSESSMENT_YEAR_LINE.is_match(c));
        if found.is_some() {
            return found;
        }
    }

    ASSESSMENT_YEAR
        .iter()
        .find_map(|re| re.captures(text).map(|c| c[1].to_string()))
}

/// Line after a bare "Name" label, skipping section headers.
fn name(lines: &[&str]) -> Option<String> {
    let idx = lines
        .iter()
        .position(|l| clean_label(l).eq_ignore_ascii_case("name"))?;

    lines
        .iter()
        .skip(idx + 1)
        .take(3)
        .map(|l| clean_label(l))
        .find(|cand| {
            let lower = cand.to_lowercase();
            cand.chars().count() > 2
                && !SECTION_WORDS.contains(&lower.as_str())
                && cand.starts_with(|c: char| c.is_ascii_alphabetic())
        })
}

/// Refund below a "refundable" or "tax payable" row: negative values are
/// refunds, positive ones only count above 1000.
fn refund(lines: &[&str]) -> Option<f64> {
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !lower.contains("refundable") && !lower.contains("tax payable") {
            continue;
        }
        for cand in lines.iter().skip(i + 1).take(4) {
            let cand = clean_label(cand).replace([',', ' '], "");
            if cand.chars().count() <= 2 || !SIGNED_NUMBER.is_match(&cand) {
                continue;
            }
            if let Ok(v) = cand.parse::<f64>() {
                if v < 0.0 {
                    return Some(-v);
                }
                if v > 1000.0 {
                    return Some(v);
                }
            }
        }
    }
    None
}

/// Date on an acknowledgement/submission line first, then any date.
fn filing_date(lines: &[&str]) -> Option<RecognizedDate> {
    let on_marker_line = lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        let marked = ["electronically", "submitted", "acknowledgement", "filed on"]
            .iter()
            .any(|m| lower.contains(m));
        if marked {
            FILING_DATE.find(line)
        } else {
            None
        }
    });

    on_marker_line
        .or_else(|| lines.iter().find_map(|line| FILING_DATE.find(line)))
        .map(|m| parse_date(m.as_str()))
}
