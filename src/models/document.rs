//! Document jobs and the batch request surface.
//!
//! A [`DocumentJob`] is built once per manifest entry that has matching
//! uploaded content and is then owned by exactly one extraction task.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Caller-declared kind of a document. Never inferred from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    SalarySlip,
    BankStatement,
    #[serde(alias = "itr")]
    TaxReturn,
    #[serde(alias = "aadhaar", alias = "aadhar")]
    IdentityCard,
    #[serde(alias = "driving_licence", alias = "dl")]
    DrivingLicense,
    AppointmentLetter,
    #[serde(alias = "employee_id_card")]
    EmployeeId,
    #[serde(alias = "pan")]
    PanCard,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 8] = [
        Self::SalarySlip,
        Self::BankStatement,
        Self::TaxReturn,
        Self::IdentityCard,
        Self::DrivingLicense,
        Self::AppointmentLetter,
        Self::EmployeeId,
        Self::PanCard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SalarySlip => "salary_slip",
            Self::BankStatement => "bank_statement",
            Self::TaxReturn => "tax_return",
            Self::IdentityCard => "identity_card",
            Self::DrivingLicense => "driving_license",
            Self::AppointmentLetter => "appointment_letter",
            Self::EmployeeId => "employee_id",
            Self::PanCard => "pan_card",
        }
    }

    /// Identity cards are the only kind that may carry a machine-readable code.
    pub fn carries_code(&self) -> bool {
        matches!(self, Self::IdentityCard)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "salary_slip" | "payslip" | "salary" => Ok(Self::SalarySlip),
            "bank_statement" | "bank" => Ok(Self::BankStatement),
            "tax_return" | "itr" => Ok(Self::TaxReturn),
            "identity_card" | "aadhaar" | "aadhar" => Ok(Self::IdentityCard),
            "driving_license" | "driving_licence" | "dl" => Ok(Self::DrivingLicense),
            "appointment_letter" | "offer_letter" => Ok(Self::AppointmentLetter),
            "employee_id" | "employee_id_card" => Ok(Self::EmployeeId),
            "pan_card" | "pan" => Ok(Self::PanCard),
            other => Err(format!("unknown document kind: {}", other)),
        }
    }
}

/// Container formats the cascade knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Pdf,
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Webp,
}

impl InputFormat {
    /// Detect the format from magic bytes, falling back to the file extension.
    pub fn detect(content: &[u8], filename: &str) -> Option<Self> {
        if let Some(kind) = infer::get(content) {
            if let Some(format) = Self::from_mime(kind.mime_type()) {
                return Some(format);
            }
        }

        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())?;
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(Self::Pdf),
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            "image/tiff" => Some(Self::Tiff),
            "image/bmp" => Some(Self::Bmp),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
        }
    }
}

/// One document to extract: caller metadata plus raw bytes.
#[derive(Clone)]
pub struct DocumentJob {
    pub filename: String,
    pub kind: DocumentKind,
    pub password: Option<String>,
    pub content: Vec<u8>,
}

impl DocumentJob {
    pub fn new(filename: impl Into<String>, kind: DocumentKind, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            kind,
            password: None,
            content,
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    pub fn format(&self) -> Option<InputFormat> {
        InputFormat::detect(&self.content, &self.filename)
    }

    /// SHA-256 of the raw content, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.content);
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for DocumentJob {
    // Keep passwords and document bytes out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentJob")
            .field("filename", &self.filename)
            .field("kind", &self.kind)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("bytes", &self.content.len())
            .finish()
    }
}

/// Manifest entry declaring the kind (and optional password) of one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub doc_type: DocumentKind,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub documents: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// An uploaded file as received from the request surface.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }
}

/// A batch request: uploads plus the manifest describing them.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub manifest: Manifest,
    pub files: Vec<UploadedFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_aliases() {
        assert_eq!("itr".parse::<DocumentKind>(), Ok(DocumentKind::TaxReturn));
        assert_eq!(
            "Salary-Slip".parse::<DocumentKind>(),
            Ok(DocumentKind::SalarySlip)
        );
        assert_eq!(
            "aadhaar".parse::<DocumentKind>(),
            Ok(DocumentKind::IdentityCard)
        );
        assert!("passport".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_kind_round_trips_as_str() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.as_str().parse::<DocumentKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_manifest_parsing() {
        let json = r#"{"documents":[
            {"filename":"slip.pdf","doc_type":"salary_slip"},
            {"filename":"stmt.pdf","doc_type":"bank_statement","password":"secret"},
            {"filename":"itr.pdf","doc_type":"itr"}
        ]}"#;
        let manifest = Manifest::from_json(json).unwrap();
        assert_eq!(manifest.documents.len(), 3);
        assert_eq!(manifest.documents[1].password.as_deref(), Some("secret"));
        assert_eq!(manifest.documents[2].doc_type, DocumentKind::TaxReturn);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            InputFormat::detect(b"%PDF-1.7\n", "x.bin"),
            Some(InputFormat::Pdf)
        );
        assert_eq!(
            InputFormat::detect(b"not really", "scan.JPG"),
            Some(InputFormat::Jpeg)
        );
        assert_eq!(InputFormat::detect(b"plain text", "notes.txt"), None);
    }

    #[test]
    fn test_empty_password_is_dropped() {
        let job = DocumentJob::new("a.pdf", DocumentKind::SalarySlip, vec![])
            .with_password(Some(String::new()));
        assert!(job.password.is_none());
        assert!(!format!("{:?}", job).contains("secret"));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let job = DocumentJob::new("a.pdf", DocumentKind::SalarySlip, b"abc".to_vec());
        assert_eq!(
            job.fingerprint(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
