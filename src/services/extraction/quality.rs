//! Quality scoring and text-layer acceptance.

use std::collections::BTreeSet;

use crate::config::ExtractionSettings;
use crate::models::{DocumentKind, DocumentQuality, QualityIssue};
use crate::parsers::tax_return::text_quality_score;

/// Whether a PDF text layer is good enough to skip rasterization.
///
/// Tax returns are scored on length and vocabulary; everything else only
/// needs enough characters.
pub fn accepts_text_layer(kind: DocumentKind, text: &str, settings: &ExtractionSettings) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    match kind {
        DocumentKind::TaxReturn => text_quality_score(trimmed) >= settings.tax_return_min_text_score,
        _ => trimmed.chars().count() >= settings.min_text_layer_chars,
    }
}

/// Mean of the page confidences that were reported.
pub fn mean_confidence(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Score OCR output: engine confidence blended 50/50 with the resolution
/// placeholder, flagged below the floor.
pub fn ocr_quality(
    confidence: Option<f64>,
    settings: &ExtractionSettings,
    mut issues: BTreeSet<QualityIssue>,
) -> DocumentQuality {
    let ocr_confidence = confidence
        .unwrap_or(settings.default_engine_confidence)
        .clamp(0.0, 100.0);
    let resolution_score = settings.resolution_placeholder;
    let final_score = (ocr_confidence + resolution_score) / 2.0;

    if final_score < settings.quality_floor {
        issues.insert(QualityIssue::LowQualityDocument);
    }

    DocumentQuality {
        resolution_score,
        ocr_confidence,
        final_score,
        issues,
    }
}

/// Maximal quality for text that needed no recognition, keeping any issues
/// seen on the way.
pub fn direct_quality(issues: BTreeSet<QualityIssue>) -> DocumentQuality {
    DocumentQuality {
        issues,
        ..DocumentQuality::maximal()
    }
}
