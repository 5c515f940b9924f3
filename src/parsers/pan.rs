//! Permanent account number card heuristics.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{is_plausible_name, pan, parse_date, title_case};
use crate::models::{text_lines, PanCard};

static DOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(0[1-9]|[12][0-9]|3[01])[/-](0[1-9]|1[0-2])[/-][0-9]{4}\b").unwrap()
});

/// Header lines printed on every card.
const HEADER_WORDS: &[&str] = &["INCOME", "GOVT", "TAX", "DEPARTMENT"];

pub fn parse(text: &str) -> PanCard {
    let upper = text.to_uppercase();
    let lines: Vec<&str> = text_lines(&upper)
        .into_iter()
        .filter(|l| l.chars().count() >= 3 && !HEADER_WORDS.iter().any(|w| l.contains(w)))
        .collect();

    let (name, father_name) = names(&lines);
    PanCard {
        pan: pan(text),
        name: name.map(|n| title_case(&n)),
        father_name: father_name.map(|n| title_case(&n)),
        dob: DOB.find(&upper).map(|m| parse_date(m.as_str())),
        ..Default::default()
    }
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// Value on the line after a label line matching `is_label`.
fn after_label<F>(lines: &[&str], is_label: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    lines.windows(2).find_map(|pair| {
        (is_label(pair[0]) && !has_digit(pair[1])).then(|| pair[1].trim().to_string())
    })
}

/// Name and father's name from their labels; older cards without labels
/// print the two names as the first plausible lines, in that order.
fn names(lines: &[&str]) -> (Option<String>, Option<String>) {
    let name = after_label(lines, |l| l.contains("NAME") && !l.contains("FATHER"));
    let father = after_label(lines, |l| l.contains("FATHER"));
    if name.is_some() {
        return (name, father);
    }

    let mut plausible = lines
        .iter()
        .filter(|l| !l.contains("FATHER") && is_plausible_name(l))
        .map(|l| l.to_string());
    let name = plausible.next();
    (name, father.or_else(|| plausible.next()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_labelled_card() {
        let text = "INCOME TAX DEPARTMENT
GOVT. OF INDIA
Permanent Account Number Card
ABCDE1234F
नाम / Name
RAHUL SHARMA
पिता का नाम / Father's Name
MOHAN SHARMA
जन्म की तारीख / Date of Birth
15/08/1990";
        let card = parse(text);
        assert_eq!(card.pan.as_deref(), Some("ABCDE1234F"));
        assert_eq!(card.name.as_deref(), Some("Rahul Sharma"));
        assert_eq!(card.father_name.as_deref(), Some("Mohan Sharma"));
        assert_eq!(
            card.dob.and_then(|d| d.date),
            NaiveDate::from_ymd_opt(1990, 8, 15)
        );
    }

    #[test]
    fn test_unlabelled_card() {
        let text = "INCOME TAX DEPARTMENT
RAHUL SHARMA
MOHAN SHARMA
15/08/1990
Permanent Account Number
ABCDE1234F";
        let card = parse(text);
        assert_eq!(card.name.as_deref(), Some("Rahul Sharma"));
        assert_eq!(card.father_name.as_deref(), Some("Mohan Sharma"));
    }

    #[test]
    fn test_no_fields() {
        let card = parse("blurred");
        assert_eq!(card, PanCard::default());
    }
}
