//! National identity card heuristics (OCR path) and payload mapping (code path).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::text::{alpha_words, is_plausible_name, title_case};
use crate::models::{text_lines, IdentityCard, IdentitySource};
use crate::ocr::IdentityPayload;

static DOB_LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:dob|date\s*of\s*birth)\s*[:\-]?\s*([0-9]{2}[/-][0-9]{2}[/-][0-9]{4})")
        .unwrap()
});

static ANY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{2}[/-][0-9]{2}[/-][0-9]{4})\b").unwrap());

static GROUPED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})[ \t]+(\d{4})[ \t]+(\d{4})\b").unwrap());

static MASKED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bx{4}[ \t]*x{4}[ \t]*(\d{4})\b").unwrap());

static PLAIN_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{8}(\d{4})\b").unwrap());

static ADDRESS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)address\s*[:\-]?\s*(.*)").unwrap());

static LEADING_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\p{L}\p{N}]+").unwrap());

static COMMA_SPACING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").unwrap());

/// Lines that end the address block.
const ADDRESS_STOP: &[&str] = &[
    "aadhaar is proof",
    "it should be used with verification",
    "authentication",
];

/// Lines inside the block that are boilerplate, not address.
const ADDRESS_NOISE: &[&str] = &[
    "aadhaar is proof",
    "date of birth",
    "it should be used",
    "authentication",
    "online",
    "offline xml",
    "unique and secure",
];

const RELATION_MARKERS: &[&str] = &["s/o", "d/o", "c/o", "w/o"];

pub fn parse(text: &str) -> IdentityCard {
    let lines = text_lines(text);
    let (dob, dob_idx) = dob(&lines);

    IdentityCard {
        name: name_near(&lines, dob_idx),
        dob,
        gender: gender_near(&lines, dob_idx),
        address: address_block(&lines),
        id_last4: id_last4(text),
        source: IdentitySource::Ocr,
        ..Default::default()
    }
}

/// Build the record straight from a decoded QR payload.
pub fn from_payload(payload: &IdentityPayload) -> IdentityCard {
    IdentityCard {
        name: payload.name.clone(),
        dob: payload.birth(),
        gender: payload.gender.as_deref().map(expand_gender),
        address: payload.address(),
        id_last4: payload.uid_last4(),
        source: IdentitySource::Code,
        ..Default::default()
    }
}

fn expand_gender(code: &str) -> String {
    match code.trim().to_uppercase().as_str() {
        "M" | "MALE" => "Male".to_string(),
        "F" | "FEMALE" => "Female".to_string(),
        "T" | "TRANSGENDER" => "Transgender".to_string(),
        other => other.to_string(),
    }
}

/// Labelled DOB first, else the first DD/MM/YYYY, with its line index.
fn dob(lines: &[&str]) -> (Option<String>, Option<usize>) {
    for re in [&*DOB_LABELLED, &*ANY_DATE] {
        for (i, line) in lines.iter().enumerate() {
            if let Some(caps) = re.captures(line) {
                return (Some(caps[1].to_string()), Some(i));
            }
        }
    }
    (None, None)
}

/// First three alphabetic words of a line, Title-cased.
fn name_from_line(line: &str) -> String {
    let words: Vec<&str> = alpha_words(line)
        .into_iter()
        .filter(|w| w.chars().all(|c| c.is_ascii_alphabetic()))
        .take(3)
        .collect();
    title_case(&words.join(" "))
}

/// Up to three lines above the DOB line, then a +/-5 line window.
fn name_near(lines: &[&str], dob_idx: Option<usize>) -> Option<String> {
    let dob_idx = dob_idx.filter(|i| *i > 0)?;

    let above = (dob_idx.saturating_sub(3)..dob_idx).rev();
    let window = dob_idx.saturating_sub(5)..(dob_idx + 5).min(lines.len());

    above
        .chain(window)
        .map(|i| name_from_line(lines[i]))
        .find(|name| is_plausible_name(name))
}

fn gender_near(lines: &[&str], dob_idx: Option<usize>) -> Option<String> {
    let (start, end) = match dob_idx {
        Some(i) => (i.saturating_sub(2), (i + 5).min(lines.len())),
        None => (0, 4.min(lines.len())),
    };

    lines[start..end].iter().find_map(|line| {
        let lower = line.to_lowercase();
        if lower.contains("female") || lower.contains("महिला") {
            Some("Female".to_string())
        } else if lower.contains("male") || lower.contains("पुरुष") {
            Some("Male".to_string())
        } else {
            None
        }
    })
}

/// Last four digits of the 12-digit identifier. Groups that continue into a
/// fourth block of four belong to the 16-digit virtual ID and are skipped.
fn id_last4(text: &str) -> Option<String> {
    for caps in GROUPED_ID.captures_iter(text) {
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let rest = text[end..].trim_start_matches([' ', '\t']);
        let continues = rest.chars().take(4).filter(|c| c.is_ascii_digit()).count() == 4;
        if !continues {
            return Some(caps[3].to_string());
        }
    }
    MASKED_ID
        .captures(text)
        .or_else(|| PLAIN_ID.captures(text))
        .map(|c| c[1].to_string())
}

fn clean_address_line(line: &str) -> Option<String> {
    let line = LEADING_NOISE.replace(line, "");
    let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let line = COMMA_SPACING
        .replace_all(&line, ", ")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string();

    let lower = line.to_lowercase();
    if ADDRESS_NOISE.iter().any(|t| lower.contains(t)) {
        return None;
    }
    let significant = line.chars().filter(|c| c.is_alphanumeric()).count();
    (significant >= 4).then_some(line)
}

/// Address block from the "Address" line (or a relation line) until a
/// disclaimer, at most six lines, de-duplicated.
fn address_block(lines: &[&str]) -> Option<String> {
    let start = lines
        .iter()
        .position(|l| l.to_lowercase().contains("address"))
        .or_else(|| {
            lines.iter().position(|l| {
                let lower = l.to_lowercase();
                RELATION_MARKERS.iter().any(|m| lower.contains(m))
            })
        })?;

    let mut collected = Vec::new();
    let first = lines[start];
    if first.to_lowercase().contains("address") {
        if let Some(caps) = ADDRESS_LABEL.captures(first) {
            collected.extend(clean_address_line(&caps[1]));
        }
    } else {
        collected.extend(clean_address_line(first));
    }

    for line in &lines[start + 1..] {
        if collected.len() >= 6 {
            break;
        }
        let lower = line.to_lowercase();
        if ADDRESS_STOP.iter().any(|s| lower.contains(s)) {
            break;
        }
        collected.extend(clean_address_line(line));
    }

    let mut seen = HashSet::new();
    collected.retain(|l| seen.insert(l.clone()));
    (!collected.is_empty()).then(|| collected.join(", "))
}
