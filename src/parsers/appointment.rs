//! Appointment / offer letter heuristics.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{
    clean_person_name, company_name, corporate_line, designation, month_name, parse_date,
    title_case,
};
use crate::models::{text_lines, AppointmentLetter, RecognizedDate};

const HONORIFICS: &[&str] = &["mr", "mrs", "ms", "miss", "dr", "shri", "smt"];

const NAME_STOP_WORDS: &[&str] = &["designation", "address", "employee", "date", "subject"];

/// Lines that announce the start date.
const JOINING_MARKERS: &[&str] = &["join", "commenc", "effective", "start", "report"];

static DEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdear\s+(?:(?:mr|mrs|ms|miss|dr)\.?\s+)?([A-Z][A-Za-z]+\s+[A-Z][A-Za-z]+)")
        .unwrap()
});

static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?[.,]?\s*(\d{4})\b",
    )
    .unwrap()
});

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b",
    )
    .unwrap()
});

static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}[/.\-]\d{1,2}[/.\-]\d{4}\b").unwrap());

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:location|place\s+of\s+posting|work\s+location)\s*[:\-]?\s*([A-Za-z][A-Za-z .]*)")
        .unwrap()
});

pub fn parse(text: &str) -> AppointmentLetter {
    let lines = text_lines(text);
    AppointmentLetter {
        name: addressee(&lines).or_else(|| {
            DEAR.captures(text)
                .and_then(|c| clean_person_name(&c[1], NAME_STOP_WORDS, 4))
        }),
        company: company_name(&lines).or_else(|| corporate_line(&lines, lines.len())),
        designation: designation(&lines),
        joining_date: joining_date(&lines),
        location: LOCATION
            .captures(text)
            .map(|c| c[1].trim().trim_end_matches('.').to_string())
            .filter(|l| !l.is_empty()),
        ..Default::default()
    }
}

fn strip_honorific(line: &str) -> String {
    line.split_whitespace()
        .skip_while(|w| {
            let bare = w.trim_end_matches('.').to_lowercase();
            HONORIFICS.contains(&bare.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Name within two lines of a bare "To" salutation.
fn addressee(lines: &[&str]) -> Option<String> {
    let idx = lines.iter().position(|l| {
        let bare = l.trim_end_matches(['.', ',', ':']).trim();
        bare.eq_ignore_ascii_case("to")
    })?;

    lines.iter().skip(idx + 1).take(2).find_map(|line| {
        clean_person_name(&strip_honorific(line), NAME_STOP_WORDS, 4).map(|n| title_case(&n))
    })
}

/// First date in a line: month-name forms are normalised before parsing,
/// the raw text is kept as recognised.
fn date_in(line: &str) -> Option<RecognizedDate> {
    if let Some(c) = MONTH_FIRST.captures(line) {
        let normalised = format!("{} {} {}", month_name(&c[1])?, &c[2], &c[3]);
        return Some(RecognizedDate {
            raw: c[0].to_string(),
            date: parse_date(&normalised).date,
        });
    }
    if let Some(c) = DAY_FIRST.captures(line) {
        let normalised = format!("{} {} {}", &c[1], month_name(&c[2])?, &c[3]);
        return Some(RecognizedDate {
            raw: c[0].to_string(),
            date: parse_date(&normalised).date,
        });
    }
    NUMERIC_DATE.find(line).map(|m| parse_date(m.as_str()))
}

/// Date on a joining/commencement line first, then the first date anywhere.
fn joining_date(lines: &[&str]) -> Option<RecognizedDate> {
    let on_marker = lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if JOINING_MARKERS.iter().any(|m| lower.contains(m)) {
            date_in(line)
        } else {
            None
        }
    });
    on_marker.or_else(|| lines.iter().find_map(|line| date_in(line)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LETTER: &str = "TechNova Solutions Pvt Ltd
Date: 02/04/2025
To.
Mr. Roshan Kumara
Bengaluru
Subject: Appointment Letter
Dear Roshan Kumara,
We are pleased to appoint you as Software Engineer.
You are required to join us from May 15. 2025.
Location: Bangalore";

    #[test]
    fn test_parse_letter() {
        let letter = parse(LETTER);
        assert_eq!(letter.name.as_deref(), Some("Roshan Kumara"));
        assert_eq!(letter.company.as_deref(), Some("TechNova Solutions Pvt Ltd"));
        assert_eq!(letter.designation.as_deref(), Some("Software Engineer"));
        assert_eq!(letter.location.as_deref(), Some("Bangalore"));

        let joining = letter.joining_date.unwrap();
        assert_eq!(joining.date, NaiveDate::from_ymd_opt(2025, 5, 15));
        assert_eq!(joining.iso().as_deref(), Some("2025-05-15"));
    }

    #[test]
    fn test_dear_fallback() {
        let letter = parse("Dear Ms. Anita Rao,\nWelcome aboard.");
        assert_eq!(letter.name.as_deref(), Some("Anita Rao"));
    }

    #[test]
    fn test_day_first_and_numeric_dates() {
        assert_eq!(
            date_in("joining on 1st June, 2024").and_then(|d| d.date),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(
            date_in("Date of joining: 03-07-2023").and_then(|d| d.date),
            NaiveDate::from_ymd_opt(2023, 7, 3)
        );
        assert!(date_in("no date").is_none());
    }

    #[test]
    fn test_joining_line_preferred_over_letter_date() {
        let lines = ["Date: 02/04/2025", "Your date of joining is 15/05/2025"];
        assert_eq!(joining_date(&lines).unwrap().raw, "15/05/2025");
    }
}
