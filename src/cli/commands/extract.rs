//! Single-document extraction commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use serde_json::json;

use docverify::config::Config;
use docverify::models::{DocumentKind, StructuredRecord};
use docverify::parsers::parse_record;
use docverify::services::{employment_check, ExtractionCascade};

use super::helpers::{extract_blocking, print_json, read_job};

pub async fn cmd_extract(
    config: &Config,
    kind: DocumentKind,
    file: &Path,
    password: Option<String>,
) -> anyhow::Result<()> {
    let cascade = Arc::new(ExtractionCascade::from_config(config));
    let job = read_job(file, kind, password)?;
    let doc = extract_blocking(cascade, job).await?;
    print_json(&doc)
}

/// One file goes through the full cascade; several are images of one card.
pub async fn cmd_identity(
    config: &Config,
    files: &[PathBuf],
    password: Option<String>,
) -> anyhow::Result<()> {
    if let [file] = files {
        return cmd_extract(config, DocumentKind::IdentityCard, file, password).await;
    }
    if password.is_some() {
        eprintln!(
            "{} --password is ignored for multi-image identity cards",
            style("!").yellow()
        );
    }

    let cascade = ExtractionCascade::from_config(config);
    let jobs = files
        .iter()
        .map(|f| read_job(f, DocumentKind::IdentityCard, None))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let record = tokio::task::spawn_blocking(move || {
        cascade
            .extract_images(&jobs)
            .map(|extraction| parse_record(DocumentKind::IdentityCard, &extraction))
    })
    .await??;
    print_json(&record)
}

pub async fn cmd_employment(config: &Config, id_card: &Path, letter: &Path) -> anyhow::Result<()> {
    let cascade = Arc::new(ExtractionCascade::from_config(config));
    let card_job = read_job(id_card, DocumentKind::EmployeeId, None)?;
    let letter_job = read_job(letter, DocumentKind::AppointmentLetter, None)?;

    let (card_doc, letter_doc) = tokio::try_join!(
        extract_blocking(cascade.clone(), card_job),
        extract_blocking(cascade, letter_job)
    )?;

    let StructuredRecord::EmployeeId(card) = card_doc.record else {
        anyhow::bail!("{} did not yield an employee ID record", card_doc.filename);
    };
    let StructuredRecord::AppointmentLetter(letter) = letter_doc.record else {
        anyhow::bail!("{} did not yield an appointment letter record", letter_doc.filename);
    };

    let check = employment_check(std::slice::from_ref(&card), std::slice::from_ref(&letter));
    if let Some(check) = &check {
        let status = if check.verified() {
            style("✓ verified").green()
        } else {
            style("✗ mismatch").red()
        };
        eprintln!("Employment: {}", status);
    }

    print_json(&json!({
        "employee_id": card,
        "appointment_letter": letter,
        "employment": check,
    }))
}
