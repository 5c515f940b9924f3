//! Driving licence heuristics.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{clean_person_name, parse_date, title_case};
use crate::models::{text_lines, DrivingLicense, RecognizedDate};

static LICENSE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2})[ -]?(\d{2})[ -]?(\d{6,12})\b").unwrap());

static ANY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}[/.\-]\d{2}[/.\-]\d{4}\b").unwrap());

static ISSUE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DATE\s+OF\s+ISSUED?|DATE\s+ISSUE|\bDOI\b|ISSUED\s+ON").unwrap());

static VALID_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"VALID\s+(?:TO|UPTO|TILL)|VALIDITY|VALID").unwrap());

static BIRTH_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DATE\s+OF\s+BIRTH|DATE\s+BIRTH|\bDOB\b").unwrap());

static ADDRESS_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9,\s\-/.#]+$").unwrap());

const RELATION_MARKERS: &[&str] = &["SON/DAUGHTER/WIFE OF", "S/D/W OF", "S/O", "D/O", "W/O"];

const NAME_STOP_WORDS: &[&str] = &[
    "son", "daughter", "wife", "of", "dob", "date", "blood", "s", "d", "w",
];

pub fn parse(text: &str) -> DrivingLicense {
    let upper = text.to_uppercase();
    let lines = text_lines(&upper);
    let (issue, valid, dob) = dates(&upper);

    DrivingLicense {
        name: name(&lines),
        license_number: LICENSE_NUMBER
            .captures(&upper)
            .map(|c| format!("{}{}{}", &c[1], &c[2], &c[3])),
        dob: dob.map(|d| parse_date(&d)),
        issue_date: issue,
        valid_till: valid,
        address: address(&lines),
        ..Default::default()
    }
}

fn date_after(text: &str, marker: &Regex) -> Option<String> {
    let m = marker.find(text)?;
    ANY_DATE
        .find(&text[m.end()..])
        .map(|d| d.as_str().to_string())
}

/// Issue, valid-till and birth dates. Issue and validity fall back to the
/// first two dates on the card; the pair is swapped if out of order.
fn dates(text: &str) -> (Option<RecognizedDate>, Option<RecognizedDate>, Option<String>) {
    let all: Vec<&str> = ANY_DATE.find_iter(text).map(|m| m.as_str()).collect();

    let issue = date_after(text, &ISSUE_MARKER).or_else(|| all.first().map(|s| s.to_string()));
    let valid = date_after(text, &VALID_MARKER).or_else(|| {
        let pos = issue
            .as_deref()
            .and_then(|i| all.iter().position(|d| *d == i))
            .unwrap_or(0);
        all.get(pos + 1).map(|s| s.to_string())
    });

    let dob = date_after(text, &BIRTH_MARKER).or_else(|| {
        all.last()
            .filter(|d| Some(**d) != issue.as_deref() && Some(**d) != valid.as_deref())
            .map(|s| s.to_string())
    });

    let mut issue = issue.map(|s| parse_date(&s));
    let mut valid = valid.map(|s| parse_date(&s));

    let parsed = |d: &Option<RecognizedDate>| d.as_ref().and_then(|d| d.date);
    match (parsed(&issue), parsed(&valid)) {
        (Some(i), Some(v)) if v < i => std::mem::swap(&mut issue, &mut valid),
        (Some(i), None) => {
            if let Some(later) = all
                .iter()
                .rev()
                .map(|d| parse_date(d))
                .find(|d| d.date.is_some_and(|d| d > i))
            {
                valid = Some(later);
            }
        }
        (None, Some(v)) => {
            if let Some(earlier) = all
                .iter()
                .map(|d| parse_date(d))
                .find(|d| d.date.is_some_and(|d| d < v))
            {
                issue = Some(earlier);
            }
        }
        _ => {}
    }

    (issue, valid, dob)
}

/// Name after a NAME marker on the same line, else on the next line.
fn name(lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let Some(idx) = line.find("NAME") else {
            continue;
        };
        if RELATION_MARKERS.iter().any(|m| line.contains(m)) || line.contains("FATHER") {
            continue;
        }

        let inline = line[idx + "NAME".len()..].trim_start_matches([':', ' ', '-']);
        if let Some(name) = clean_person_name(inline, NAME_STOP_WORDS, 4) {
            return Some(title_case(&name));
        }

        let Some(next) = lines.get(i + 1) else {
            continue;
        };
        if !ANY_DATE.is_match(next) && !next.contains("BLOOD") {
            if let Some(name) = clean_person_name(next, NAME_STOP_WORDS, 4) {
                return Some(title_case(&name));
            }
        }
    }
    None
}

/// Address after an ADDRESS marker, else after a relation marker, continued
/// over following lines made only of address characters.
fn address(lines: &[&str]) -> Option<String> {
    let (start, marker) = lines
        .iter()
        .enumerate()
        .find_map(|(i, l)| l.find("ADDRESS").map(|idx| (i, idx + "ADDRESS".len())))
        .or_else(|| {
            lines.iter().enumerate().find_map(|(i, l)| {
                RELATION_MARKERS
                    .iter()
                    .find_map(|m| l.find(m).map(|idx| (i, idx + m.len())))
            })
        })?;

    let mut parts = Vec::new();
    let head = lines[start][marker..].trim_start_matches([':', ' ', '-']).trim();
    if !head.is_empty() {
        parts.push(head.to_string());
    }
    for line in lines.iter().skip(start + 1).take(3) {
        if !ADDRESS_CHARS.is_match(line) || ANY_DATE.is_match(line) {
            break;
        }
        parts.push(line.trim().to_string());
    }

    (!parts.is_empty()).then(|| parts.join(", "))
}
