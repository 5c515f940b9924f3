//! Cross-verification verdict and the batch response that carries it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::DocumentKind;
use super::records::{
    AppointmentLetter, BankStatement, DrivingLicense, EmployeeIdCard, ExtractedDocument,
    IdentityCard, PanCard, SalarySlip, StructuredRecord, TaxReturn,
};

/// Employee-ID card compared against an appointment letter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmploymentCheck {
    pub name_match: bool,
    pub company_match: bool,
}

impl EmploymentCheck {
    pub fn verified(&self) -> bool {
        self.name_match && self.company_match
    }
}

/// Outcome of reconciling salary slips against a bank statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossCheckVerdict {
    pub name_match: bool,
    /// Best edit-distance similarity in [0, 1] between any slip name and the holder.
    pub name_similarity: f64,
    pub account_match: bool,
    /// Salary records with no matching credit, as "Missing credit for {period}: {amount}".
    pub unmatched_credits: Vec<String>,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment: Option<EmploymentCheck>,
}

/// A document that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub filename: String,
    pub kind: DocumentKind,
    pub error: String,
    /// True when the failure was a missing or wrong password.
    pub decryption: bool,
}

/// Records partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub salary_slips: Vec<SalarySlip>,
    pub bank_statements: Vec<BankStatement>,
    pub tax_returns: Vec<TaxReturn>,
    pub identity_cards: Vec<IdentityCard>,
    pub driving_licenses: Vec<DrivingLicense>,
    pub appointment_letters: Vec<AppointmentLetter>,
    pub employee_ids: Vec<EmployeeIdCard>,
    pub pan_cards: Vec<PanCard>,
}

impl RecordSet {
    pub fn push(&mut self, record: StructuredRecord) {
        match record {
            StructuredRecord::SalarySlip(r) => self.salary_slips.push(r),
            StructuredRecord::BankStatement(r) => self.bank_statements.push(r),
            StructuredRecord::TaxReturn(r) => self.tax_returns.push(r),
            StructuredRecord::IdentityCard(r) => self.identity_cards.push(r),
            StructuredRecord::DrivingLicense(r) => self.driving_licenses.push(r),
            StructuredRecord::AppointmentLetter(r) => self.appointment_letters.push(r),
            StructuredRecord::EmployeeId(r) => self.employee_ids.push(r),
            StructuredRecord::PanCard(r) => self.pan_cards.push(r),
        }
    }

    pub fn len(&self) -> usize {
        self.salary_slips.len()
            + self.bank_statements.len()
            + self.tax_returns.len()
            + self.identity_cards.len()
            + self.driving_licenses.len()
            + self.appointment_letters.len()
            + self.employee_ids.len()
            + self.pan_cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<StructuredRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = StructuredRecord>>(iter: I) -> Self {
        let mut set = Self::default();
        for record in iter {
            set.push(record);
        }
        set
    }
}

/// Everything a batch produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub batch_id: Uuid,
    pub processed_at: DateTime<Utc>,
    pub records: RecordSet,
    /// Per-file provenance for every record, in manifest order.
    pub documents: Vec<ExtractedDocument>,
    pub cross_check: CrossCheckVerdict,
    pub failures: Vec<DocumentFailure>,
    /// Manifest entries with no matching upload.
    pub skipped: Vec<String>,
    pub min_quality_score: f64,
}
