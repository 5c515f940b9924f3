//! Employee identity card heuristics.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{company_name, corporate_line, designation, is_plausible_name, value_after_label};
use crate::models::{text_lines, EmployeeIdCard};

static TITLE_CASE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+(?: [A-Z][a-z]+){1,2}$").unwrap());

static EMPLOYEE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(EMP[- ]?\d{3,})\b").unwrap());

const ID_LABELS: &[&str] = &["employee id", "emp id", "employee code", "emp code", "emp no"];

pub fn parse(text: &str) -> EmployeeIdCard {
    let lines = text_lines(text);
    EmployeeIdCard {
        name: name(&lines),
        employee_id: employee_id(&lines, text),
        company: company_name(&lines).or_else(|| corporate_line(&lines, lines.len())),
        designation: designation(&lines),
        ..Default::default()
    }
}

/// First Title-Case line of two or three words that is not a company or role.
fn name(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .copied()
        .filter(|l| TITLE_CASE_NAME.is_match(l) && is_plausible_name(l))
        .find(|l| company_name(&[*l]).is_none() && designation(&[*l]).is_none())
        .map(str::to_string)
}

fn employee_id(lines: &[&str], text: &str) -> Option<String> {
    EMPLOYEE_ID
        .captures(text)
        .map(|c| c[1].to_uppercase())
        .or_else(|| {
            lines.iter().find_map(|line| {
                ID_LABELS
                    .iter()
                    .find_map(|label| value_after_label(line, label))
                    .and_then(|v| v.split_whitespace().next().map(str::to_string))
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = "TechNova Solutions Pvt Ltd
Rohan Sharma
Software Engineer
ID: EMP-1042
Valid till 12/2026";

    #[test]
    fn test_parse_card() {
        let card = parse(CARD);
        assert_eq!(card.name.as_deref(), Some("Rohan Sharma"));
        assert_eq!(card.employee_id.as_deref(), Some("EMP-1042"));
        assert_eq!(card.company.as_deref(), Some("TechNova Solutions Pvt Ltd"));
        assert_eq!(card.designation.as_deref(), Some("Software Engineer"));
    }

    #[test]
    fn test_labelled_employee_id() {
        let lines = ["Emp ID: TN55821"];
        assert_eq!(employee_id(&lines, lines[0]).as_deref(), Some("TN55821"));
    }

    #[test]
    fn test_role_line_is_not_a_name() {
        let lines = ["Senior Manager", "Kavya Iyer"];
        assert_eq!(name(&lines).as_deref(), Some("Kavya Iyer"));
    }
}
