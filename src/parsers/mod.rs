//! Field extraction heuristics, one module per document kind.
//!
//! Parsers take recognized text and return a record whose fields are `None`
//! when nothing plausible was found. A heuristic miss is never an error.

pub mod appointment;
pub mod bank;
pub mod employee_id;
pub mod identity;
pub mod license;
pub mod pan;
pub mod salary;
pub mod tax_return;
pub mod text;

use crate::models::{
    AppointmentLetter, BankStatement, DocumentKind, DocumentQuality, DrivingLicense,
    EmployeeIdCard, ExtractionResult, IdentityCard, PanCard, QualityIssue, SalarySlip,
    StructuredRecord, TaxReturn,
};
use crate::ocr::IdentityPayload;

/// Turn an extraction into the record for the declared kind, carrying the
/// extraction's quality metadata.
pub fn parse_record(kind: DocumentKind, extraction: &ExtractionResult) -> StructuredRecord {
    let text = extraction.text.as_str();
    let quality = extraction.quality.clone();

    match kind {
        DocumentKind::SalarySlip => StructuredRecord::SalarySlip(SalarySlip {
            quality,
            ..salary::parse(text)
        }),
        DocumentKind::BankStatement => StructuredRecord::BankStatement(BankStatement {
            quality,
            ..bank::parse(text)
        }),
        DocumentKind::TaxReturn => StructuredRecord::TaxReturn(TaxReturn {
            quality,
            ..tax_return::parse(text)
        }),
        DocumentKind::IdentityCard => {
            StructuredRecord::IdentityCard(identity_record(extraction, quality))
        }
        DocumentKind::DrivingLicense => StructuredRecord::DrivingLicense(DrivingLicense {
            quality,
            ..license::parse(text)
        }),
        DocumentKind::AppointmentLetter => {
            StructuredRecord::AppointmentLetter(AppointmentLetter {
                quality,
                ..appointment::parse(text)
            })
        }
        DocumentKind::EmployeeId => StructuredRecord::EmployeeId(EmployeeIdCard {
            quality,
            ..employee_id::parse(text)
        }),
        DocumentKind::PanCard => StructuredRecord::PanCard(PanCard {
            quality,
            ..pan::parse(text)
        }),
    }
}

/// A decoded code payload is taken as-is; OCR text goes through the
/// heuristics. Either way a card with no name and no identifier is tagged.
fn identity_record(extraction: &ExtractionResult, mut quality: DocumentQuality) -> IdentityCard {
    let card = if extraction.is_code() {
        match IdentityPayload::parse(&extraction.text) {
            Ok(payload) => identity::from_payload(&payload),
            Err(e) => {
                tracing::warn!("Decoded payload unreadable, falling back to text heuristics: {}", e);
                identity::parse(&extraction.text)
            }
        }
    } else {
        identity::parse(&extraction.text)
    };

    if card.name.is_none() && card.id_last4.is_none() {
        quality.issues.insert(QualityIssue::IdentityFieldsMissing);
    }
    IdentityCard { quality, ..card }
}
