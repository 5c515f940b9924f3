//! Structured records recovered from each document kind.
//!
//! Every field is optional: `None` means "not recovered", which is distinct
//! from a recovered zero or empty value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::document::DocumentKind;
use super::extraction::{Channel, DocumentQuality};

/// A date as recognized, with its parsed value when one of the accepted
/// formats matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedDate {
    pub raw: String,
    pub date: Option<NaiveDate>,
}

impl RecognizedDate {
    pub fn iso(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// One statement line. Order follows the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: RecognizedDate,
    pub description: String,
    pub amount: f64,
    pub is_credit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalarySlip {
    pub employee_name: Option<String>,
    pub employer_name: Option<String>,
    pub pay_month: Option<String>,
    pub net_salary: Option<f64>,
    pub account_number: Option<String>,
    pub quality: DocumentQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankStatement {
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub ifsc: Option<String>,
    pub period_from: Option<RecognizedDate>,
    pub period_to: Option<RecognizedDate>,
    pub transactions: Vec<Transaction>,
    pub quality: DocumentQuality,
}

impl BankStatement {
    pub fn credits(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| t.is_credit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxReturn {
    pub pan: Option<String>,
    pub name: Option<String>,
    pub assessment_year: Option<String>,
    pub total_income: Option<f64>,
    pub tax_paid: Option<f64>,
    pub refund_amount: Option<f64>,
    pub filing_date: Option<RecognizedDate>,
    pub quality: DocumentQuality,
}

/// Where identity fields came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    Code,
    #[default]
    Ocr,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityCard {
    pub name: Option<String>,
    /// Full date of birth when available, otherwise the year of birth.
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    /// Only the last four digits of the identifier are ever exposed.
    pub id_last4: Option<String>,
    pub source: IdentitySource,
    pub quality: DocumentQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrivingLicense {
    pub name: Option<String>,
    pub license_number: Option<String>,
    pub dob: Option<RecognizedDate>,
    pub issue_date: Option<RecognizedDate>,
    pub valid_till: Option<RecognizedDate>,
    pub address: Option<String>,
    pub quality: DocumentQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentLetter {
    pub name: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<RecognizedDate>,
    pub location: Option<String>,
    pub quality: DocumentQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeIdCard {
    pub name: Option<String>,
    pub employee_id: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub quality: DocumentQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanCard {
    pub pan: Option<String>,
    pub name: Option<String>,
    pub father_name: Option<String>,
    pub dob: Option<RecognizedDate>,
    pub quality: DocumentQuality,
}

/// Tagged union over all supported document kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredRecord {
    SalarySlip(SalarySlip),
    BankStatement(BankStatement),
    TaxReturn(TaxReturn),
    IdentityCard(IdentityCard),
    DrivingLicense(DrivingLicense),
    AppointmentLetter(AppointmentLetter),
    EmployeeId(EmployeeIdCard),
    PanCard(PanCard),
}

impl StructuredRecord {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::SalarySlip(_) => DocumentKind::SalarySlip,
            Self::BankStatement(_) => DocumentKind::BankStatement,
            Self::TaxReturn(_) => DocumentKind::TaxReturn,
            Self::IdentityCard(_) => DocumentKind::IdentityCard,
            Self::DrivingLicense(_) => DocumentKind::DrivingLicense,
            Self::AppointmentLetter(_) => DocumentKind::AppointmentLetter,
            Self::EmployeeId(_) => DocumentKind::EmployeeId,
            Self::PanCard(_) => DocumentKind::PanCard,
        }
    }

    pub fn quality(&self) -> &DocumentQuality {
        match self {
            Self::SalarySlip(r) => &r.quality,
            Self::BankStatement(r) => &r.quality,
            Self::TaxReturn(r) => &r.quality,
            Self::IdentityCard(r) => &r.quality,
            Self::DrivingLicense(r) => &r.quality,
            Self::AppointmentLetter(r) => &r.quality,
            Self::EmployeeId(r) => &r.quality,
            Self::PanCard(r) => &r.quality,
        }
    }
}

/// A record together with the file it came from and how it was extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub filename: String,
    pub source_sha256: String,
    pub channel: Channel,
    pub record: StructuredRecord,
}
