//! Shared primitives for label-anchored field extraction.
//!
//! Every helper returns `None` when nothing plausible is found; callers never
//! see an error from a heuristic miss.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::RecognizedDate;

/// Date formats tried in order; the first that parses to a sane year wins.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d/%m/%y",
    "%d-%m-%y",
];

/// Words that mark a line as institutional boilerplate rather than a name.
const INSTITUTIONAL_WORDS: &[&str] = &[
    "government", "india", "authority", "unique", "identification", "aadhaar", "address",
    "department", "income", "tax", "bank", "limited", "ltd", "pvt", "private", "statement",
    "account", "salary", "payslip", "republic", "licence", "license", "transport", "union",
    "card", "pin", "code", "dob", "male", "female", "year", "birth",
];

pub const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Company-name markers used to spot an employer line.
const CORPORATE_MARKERS: &[&str] = &[
    "PVT", "PRIVATE", "LTD", "LIMITED", "LLP", "TECHNOLOGY", "TECHNOLOGIES", "TECH",
    "SOLUTIONS", "INC", "CORP", "CORPORATION",
];

static ACCOUNT_LABELED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"account\s*(?:number|num|no\.?)[\s\-]*([0-9]{9,18})",
        r"a/c\s*(?:number|no\.?)?[\s\-]*([0-9]{9,18})",
        r"\bac\s*no\.?[\s\-]*([0-9]{9,18})",
        r"\bacc\s*no\.?[\s\-]*([0-9]{9,18})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static ACCOUNT_MASKED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[x*]{4,}([0-9]{3,6})\b").unwrap());

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[0-9]{10,18}\b").unwrap());

static PAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-Z]{5}[0-9]{4}[A-Z])\b").unwrap());

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").unwrap());

static ROW_INDEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{1,2}$").unwrap());

/// Up to five capitalised words ending in a corporate suffix.
static COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b((?:[A-Z][A-Za-z0-9&'.-]*\s+){0,5}(?i:pvt\.?\s*ltd|private\s+limited|limited|ltd|llp|inc|corporation|corp|technologies|solutions)\b\.?)",
    )
    .unwrap()
});

/// Common job titles, optionally with a seniority and a discipline prefix.
static ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b((?:(?:senior|junior|lead|principal|associate|chief)\s+)?(?:(?:software|data|project|product|sales|marketing|hr|business|qa|test|devops|web|systems)\s+)?(?:engineer|developer|manager|analyst|consultant|executive|designer|architect|intern|officer|administrator))\b",
    )
    .unwrap()
});

const DESIGNATION_LABELS: &[&str] = &["designation", "position", "job title", "role"];

/// Labels whose digit runs must never be taken for an account number.
const ACCOUNT_EXCLUDED_LABELS: &[&str] = &[
    "cust id", "customer id", "cif", "cif no", "cust id no", "customer id no", "crn",
];

/// Parse a monetary amount: thousands separators, currency prefixes and a
/// trailing CR/DR marker are stripped. Returns `None` for malformed tokens.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_string();
    for prefix in ["Rs.", "Rs", "rs.", "RS.", "RS", "INR", "₹"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start().to_string();
        }
    }
    let lower = s.to_lowercase();
    for suffix in ["cr.", "dr.", "cr", "dr"] {
        if lower.ends_with(suffix) {
            s.truncate(s.len() - suffix.len());
            break;
        }
    }
    let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Parse a date against [`DATE_FORMATS`]; the raw text is kept either way.
pub fn parse_date(raw: &str) -> RecognizedDate {
    let cleaned = raw.trim().trim_end_matches(['.', ',']).replace(',', "");
    let date = DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&cleaned, fmt)
            .ok()
            .filter(|d| (1900..=2100).contains(&d.year()))
    });
    RecognizedDate {
        raw: raw.trim().to_string(),
        date,
    }
}

/// Alphabetic tokens of a line, in order.
pub fn alpha_words(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect()
}

/// "RAHUL kumar SHARMA" -> "Rahul Kumar Sharma".
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_institutional(word: &str) -> bool {
    let lower = word.to_lowercase();
    INSTITUTIONAL_WORDS.contains(&lower.as_str())
}

/// 2-4 alphabetic tokens of at least two characters, no institutional words.
pub fn is_plausible_name(candidate: &str) -> bool {
    let tokens: Vec<&str> = candidate.split_whitespace().collect();
    if !(2..=4).contains(&tokens.len()) {
        return false;
    }
    let letters: usize = tokens.iter().map(|t| t.chars().count()).sum();
    letters >= 4
        && tokens.iter().all(|t| {
            t.chars().count() >= 2 && t.chars().all(char::is_alphabetic) && !is_institutional(t)
        })
}

/// Take alphabetic words up to a stop word, keep at most `max_words`, and
/// accept the result only if it looks like a person's name.
pub fn clean_person_name(raw: &str, stop_words: &[&str], max_words: usize) -> Option<String> {
    let mut words = Vec::new();
    for word in alpha_words(raw) {
        if stop_words.contains(&word.to_lowercase().as_str()) {
            break;
        }
        words.push(word);
        if words.len() == max_words {
            break;
        }
    }
    let name = words.join(" ");
    is_plausible_name(&name).then_some(name)
}

/// First 10-18 digit account number, preferring labelled and masked forms.
pub fn account_number(text: &str) -> Option<String> {
    let cleaned = text.to_lowercase().replace(':', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for re in ACCOUNT_LABELED.iter() {
        if let Some(caps) = re.captures(&cleaned) {
            return Some(caps[1].to_string());
        }
    }

    if let Some(caps) = ACCOUNT_MASKED.captures(&cleaned) {
        return Some(caps[1].to_string());
    }

    DIGIT_RUN
        .find_iter(&cleaned)
        .find(|m| {
            let before = cleaned[..m.start()].trim_end();
            !ACCOUNT_EXCLUDED_LABELS.iter().any(|label| before.ends_with(label))
        })
        .map(|m| m.as_str().to_string())
}

/// Ten-character permanent account number (AAAAA9999A).
pub fn pan(text: &str) -> Option<String> {
    PAN.captures(&text.to_uppercase()).map(|c| c[1].to_string())
}

/// A line in the first `limit` lines that carries a company marker.
pub fn corporate_line(lines: &[&str], limit: usize) -> Option<String> {
    lines.iter().take(limit).find_map(|line| {
        let upper = line.to_uppercase();
        let has_marker = alpha_words(&upper)
            .iter()
            .any(|w| CORPORATE_MARKERS.contains(w));
        has_marker.then(|| line.trim().to_string())
    })
}

/// Company name with its corporate suffix, e.g. "TechNova Solutions Pvt Ltd".
pub fn company_name(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        COMPANY
            .captures(line)
            .map(|c| c[1].trim_end_matches(',').trim().to_string())
    })
}

/// Designation from a labelled line, else the first known job title.
pub fn designation(lines: &[&str]) -> Option<String> {
    let labelled = lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        DESIGNATION_LABELS.iter().find_map(|label| {
            let idx = lower.find(label)?;
            let rest = lower[idx + label.len()..].trim_start();
            if !rest.starts_with(':') && !rest.starts_with('-') {
                return None;
            }
            value_after_label(line, label)
        })
    });

    labelled.or_else(|| {
        lines
            .iter()
            .find_map(|line| ROLE.captures(line).map(|c| title_case(&c[1])))
    })
}

/// Full month name for a (possibly abbreviated) month token.
pub fn month_name(token: &str) -> Option<&'static str> {
    let prefix = token.get(..3)?.to_lowercase();
    MONTHS
        .iter()
        .copied()
        .find(|m| m.to_lowercase().starts_with(&prefix))
}

/// Index of the first line satisfying `pred`.
pub fn find_line<F>(lines: &[&str], pred: F) -> Option<usize>
where
    F: Fn(&str) -> bool,
{
    lines.iter().position(|l| pred(l))
}

/// Value after `label` on the same line, e.g. "Designation: Engineer".
pub fn value_after_label(line: &str, label: &str) -> Option<String> {
    let lower = line.to_lowercase();
    let idx = lower.find(label)?;
    let rest = line.get(idx + label.len()..)?;
    let value = rest.trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Number on the rows below a label line.
///
/// Looks at up to five lines after each occurrence of the label, skipping
/// 1-2 digit row indices, and takes the first multi-digit or decimal token.
pub fn number_under_label(lines: &[&str], label: &str) -> Option<f64> {
    let label = label.to_lowercase();
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.trim().to_lowercase() == label)
        .find_map(|(idx, _)| {
            lines.iter().skip(idx + 1).take(5).find_map(|line| {
                let compact: String = line
                    .chars()
                    .filter(|c| *c != ':' && *c != ',' && !c.is_whitespace())
                    .collect();
                if compact.is_empty() || ROW_INDEX.is_match(&compact) {
                    return None;
                }
                NUMERIC
                    .find(&compact)
                    .and_then(|m| m.as_str().parse::<f64>().ok())
            })
        })
}
