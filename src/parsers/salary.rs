//! Salary slip heuristics.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{
    account_number, clean_person_name, corporate_line, month_name, parse_amount, MONTHS,
};
use crate::models::{text_lines, SalarySlip};

/// Words that end a name captured after a label.
const NAME_STOP_WORDS: &[&str] = &[
    "opening", "state", "branch", "bank", "acc", "account", "salary", "designation", "employee",
    "emp", "code", "id", "date", "pan", "department", "dept", "month", "uan", "location",
];

/// Month name (full or abbreviated) followed by a four-digit year.
static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[\s\-,'/]*(\d{4})\b",
    )
    .unwrap()
});

static NUMERIC_MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(0?[1-9]|1[0-2])[/-](\d{4})\b").unwrap());

/// Net pay first, then total, plain salary, and gross as a last resort.
static SALARY_AMOUNT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    const AMOUNT: &str = r"[\s:]*(?:rs\.?|inr|₹)?\s*([0-9,]+(?:\.\d+)?)";
    [
        r"(?i)net\s*(?:pay|salary|amount|payment)",
        r"(?i)total\s*(?:pay|salary|amount)",
        r"(?i)salary",
        r"(?i)gross\s*(?:pay|salary)",
    ]
    .iter()
    .map(|label| Regex::new(&format!("{}{}", label, AMOUNT)).unwrap())
    .collect()
});

static NAME_AFTER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)name\s*[:\-]\s*([A-Za-z][A-Za-z .]*)").unwrap());

/// Lines announcing the pay period.
const PERIOD_MARKERS: &[&str] = &["pay slip", "payslip", "salary slip", "pay period", "month"];

pub fn parse(text: &str) -> SalarySlip {
    let lines = text_lines(text);
    SalarySlip {
        employee_name: employee_name(&lines),
        employer_name: corporate_line(&lines, 6),
        pay_month: pay_month(&lines, text),
        net_salary: net_salary(text),
        account_number: account_number(text),
        ..Default::default()
    }
}

fn month_year_in(s: &str) -> Option<String> {
    let caps = MONTH_YEAR.captures(s)?;
    Some(format!("{} {}", month_name(&caps[1])?, &caps[2]))
}

/// "October 2025" from a period line, else the first month-year anywhere,
/// else a numeric MM/YYYY.
fn pay_month(lines: &[&str], text: &str) -> Option<String> {
    let period_line = lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if PERIOD_MARKERS.iter().any(|m| lower.contains(m)) {
            month_year_in(line)
        } else {
            None
        }
    });

    period_line.or_else(|| month_year_in(text)).or_else(|| {
        let caps = NUMERIC_MONTH_YEAR.captures(text)?;
        let month: usize = caps[1].parse().ok()?;
        Some(format!("{} {}", MONTHS.get(month.checked_sub(1)?)?, &caps[2]))
    })
}

fn net_salary(text: &str) -> Option<f64> {
    SALARY_AMOUNT.iter().find_map(|re| {
        re.captures_iter(text)
            .find_map(|caps| parse_amount(&caps[1]).filter(|v| *v > 0.0))
    })
}

/// Name after an employee-name label; if the label line has no usable value,
/// the line above it.
fn employee_name(lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !lower.contains("name") || !(lower.contains(':') || lower.contains('-')) {
            continue;
        }
        if ["company", "bank", "father", "employer", "branch"]
            .iter()
            .any(|w| lower.contains(w))
        {
            continue;
        }

        if let Some(caps) = NAME_AFTER_LABEL.captures(line) {
            if let Some(name) = clean_person_name(&caps[1], NAME_STOP_WORDS, 4) {
                return Some(name);
            }
        }

        if let Some(prev) = i.checked_sub(1).and_then(|p| lines.get(p)) {
            if corporate_line(&[prev], 1).is_none() {
                if let Some(name) = clean_person_name(prev, NAME_STOP_WORDS, 4) {
                    return Some(name);
                }
            }
        }
    }
    None
}
