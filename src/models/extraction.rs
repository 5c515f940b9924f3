//! Output of the extraction cascade.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator placed between the text of consecutive pages.
pub const PAGE_BREAK: &str = "\n\u{000C}\n";

/// Which extraction method produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    TextLayer,
    PrimaryOcr,
    SecondaryOcr,
    Code,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextLayer => "text_layer",
            Self::PrimaryOcr => "primary_ocr",
            Self::SecondaryOcr => "secondary_ocr",
            Self::Code => "code",
        }
    }
}

/// Known degradations attached to an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    PdfTextExtractionFailed,
    PdfImageExtractionFailed,
    ScannedPdfOcrFailed,
    PageOcrFailed,
    LowQualityDocument,
    IdentityFieldsMissing,
}

impl QualityIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfTextExtractionFailed => "pdf_text_extraction_failed",
            Self::PdfImageExtractionFailed => "pdf_image_extraction_failed",
            Self::ScannedPdfOcrFailed => "scanned_pdf_ocr_failed",
            Self::PageOcrFailed => "page_ocr_failed",
            Self::LowQualityDocument => "low_quality_document",
            Self::IdentityFieldsMissing => "identity_fields_missing",
        }
    }
}

/// Quality metadata carried from the extraction into every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentQuality {
    pub resolution_score: f64,
    pub ocr_confidence: f64,
    pub final_score: f64,
    pub issues: BTreeSet<QualityIssue>,
}

impl DocumentQuality {
    /// Quality of text that did not go through a recognition engine.
    pub fn maximal() -> Self {
        Self {
            resolution_score: 100.0,
            ocr_confidence: 100.0,
            final_score: 100.0,
            issues: BTreeSet::new(),
        }
    }

    pub fn has_issue(&self, issue: QualityIssue) -> bool {
        self.issues.contains(&issue)
    }
}

/// Text recovered from one logical document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Recognized text; pages are joined with [`PAGE_BREAK`].
    pub text: String,
    /// Page-level mean recognition confidence (0-100), when any engine reported one.
    pub confidence: Option<f64>,
    pub quality: DocumentQuality,
    pub channel: Channel,
    pub page_count: usize,
}

impl ExtractionResult {
    /// Trimmed, non-empty lines in source order.
    pub fn lines(&self) -> Vec<&str> {
        text_lines(&self.text)
    }

    pub fn is_code(&self) -> bool {
        self.channel == Channel::Code
    }
}

/// Split text into trimmed, non-empty lines, preserving order.
pub fn text_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_break_is_invisible_to_lines() {
        let result = ExtractionResult {
            text: format!("Name: A B{}Address: X", PAGE_BREAK),
            confidence: None,
            quality: DocumentQuality::maximal(),
            channel: Channel::PrimaryOcr,
            page_count: 2,
        };
        assert_eq!(result.lines(), vec!["Name: A B", "Address: X"]);
    }

    #[test]
    fn test_issue_serialization() {
        let json = serde_json::to_string(&QualityIssue::LowQualityDocument).unwrap();
        assert_eq!(json, format!("\"{}\"", QualityIssue::LowQualityDocument.as_str()));
    }
}
