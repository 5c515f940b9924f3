//! Cross-document verification.
//!
//! Salary slips are reconciled against the first bank statement in the
//! batch: holder name, account number, and one credit per slip for the net
//! salary. Employee-ID cards are compared against appointment letters.

use tracing::debug;

use crate::models::{
    AppointmentLetter, BankStatement, CrossCheckVerdict, EmployeeIdCard, EmploymentCheck,
    SalarySlip,
};

/// Lowercase with spaces and periods removed.
pub fn normalize_name(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect()
}

/// Fuzzy person-name equivalence.
///
/// Equal or contained after normalization, otherwise a strict majority of the
/// shorter name's words must appear (as substrings, either way) in the
/// longer name's words.
pub fn compare_names(a: &str, b: &str) -> bool {
    let (na, nb) = (normalize_name(a), normalize_name(b));
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    if na == nb || na.contains(&nb) || nb.contains(&na) {
        return true;
    }

    let lower_a = a.to_lowercase();
    let lower_b = b.to_lowercase();
    let mut short: Vec<&str> = lower_a.split_whitespace().collect();
    let mut long: Vec<&str> = lower_b.split_whitespace().collect();
    if short.len() > long.len() {
        std::mem::swap(&mut short, &mut long);
    }

    let matched = short
        .iter()
        .filter(|x| long.iter().any(|y| y.contains(**x) || x.contains(*y)))
        .count();
    matched * 2 > short.len()
}

/// Edit distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Similarity in [0, 1] from the edit distance of the normalized names.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let (na, nb) = (normalize_name(a), normalize_name(b));
    match (na.is_empty(), nb.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let max_len = na.chars().count().max(nb.chars().count());
    1.0 - levenshtein(&na, &nb) as f64 / max_len as f64
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Account numbers are compared as strings after removing whitespace.
pub fn accounts_match(a: &str, b: &str) -> bool {
    let (a, b) = (strip_whitespace(a), strip_whitespace(b));
    !a.is_empty() && a == b
}

/// Amounts equal to the cent.
fn same_amount(a: f64, b: f64) -> bool {
    (a * 100.0).round() == (b * 100.0).round()
}

/// Reconcile salary slips against the first bank statement.
pub fn verify(slips: &[SalarySlip], statements: &[BankStatement]) -> CrossCheckVerdict {
    let mut verdict = CrossCheckVerdict::default();

    let Some(statement) = statements.first() else {
        verdict
            .notes
            .push("No bank statements provided for cross-check".to_string());
        return verdict;
    };
    if statements.len() > 1 {
        verdict.notes.push(format!(
            "Using the first of {} bank statements as reference",
            statements.len()
        ));
    }
    if slips.is_empty() {
        verdict
            .notes
            .push("No salary slips provided for cross-check".to_string());
        return verdict;
    }

    let holder = statement.account_holder_name.as_deref().unwrap_or_default();
    if holder.is_empty() {
        verdict
            .notes
            .push("Account holder name not recovered from bank statement".to_string());
    }

    for (i, slip) in slips.iter().enumerate() {
        match slip.employee_name.as_deref() {
            Some(name) => {
                verdict.name_match |= compare_names(name, holder);
                verdict.name_similarity = verdict.name_similarity.max(name_similarity(name, holder));
            }
            None => verdict
                .notes
                .push(format!("Salary slip {} has no recoverable employee name", i + 1)),
        }

        match (slip.account_number.as_deref(), statement.account_number.as_deref()) {
            (Some(a), Some(b)) => verdict.account_match |= accounts_match(a, b),
            (None, _) => verdict
                .notes
                .push(format!("Salary slip {} has no recoverable account number", i + 1)),
            (Some(_), None) => {}
        }

        let Some(net) = slip.net_salary.filter(|n| *n > 0.0) else {
            continue;
        };
        let credited = statement
            .credits()
            .any(|tx| same_amount(tx.amount, net));
        if !credited {
            let period = slip.pay_month.as_deref().unwrap_or("unknown period");
            verdict
                .unmatched_credits
                .push(format!("Missing credit for {}: {:.2}", period, net));
        }
    }

    debug!(
        "Cross-check: name_match={} similarity={:.2} account_match={} unmatched={}",
        verdict.name_match,
        verdict.name_similarity,
        verdict.account_match,
        verdict.unmatched_credits.len()
    );
    verdict
}

fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            let (a, b) = (normalize_name(a), normalize_name(b));
            !a.is_empty() && a == b
        }
        _ => false,
    }
}

/// Employee-ID card against appointment letter: case-insensitive name and
/// company equality. `None` unless both kinds are present.
pub fn employment_check(
    ids: &[EmployeeIdCard],
    letters: &[AppointmentLetter],
) -> Option<EmploymentCheck> {
    let card = ids.first()?;
    let letter = letters.first()?;
    Some(EmploymentCheck {
        name_match: same_text(card.name.as_deref(), letter.name.as_deref()),
        company_match: same_text(card.company.as_deref(), letter.company.as_deref()),
    })
}
