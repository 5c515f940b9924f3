//! Data models for docverify.

mod document;
mod extraction;
mod records;
mod verdict;

pub use document::{
    BatchRequest, DocumentJob, DocumentKind, InputFormat, Manifest, ManifestEntry, UploadedFile,
};
pub use extraction::{
    text_lines, Channel, DocumentQuality, ExtractionResult, QualityIssue, PAGE_BREAK,
};
pub use records::{
    AppointmentLetter, BankStatement, DrivingLicense, EmployeeIdCard, ExtractedDocument,
    IdentityCard, IdentitySource, PanCard, RecognizedDate, SalarySlip, StructuredRecord,
    TaxReturn, Transaction,
};
pub use verdict::{
    BatchResponse, CrossCheckVerdict, DocumentFailure, EmploymentCheck, RecordSet,
};
