//! Tesseract OCR backend implementation.
//!
//! Runs the `tesseract` binary with TSV output so word confidences can be
//! averaged into a page-level score.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tracing::debug;

use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult};
use super::utils::check_binary;
use crate::config::OcrSettings;

/// Tesseract OCR backend.
pub struct TesseractBackend {
    language: String,
    tessdata_prefix: Option<PathBuf>,
}

impl TesseractBackend {
    /// Create a new Tesseract backend for English.
    pub fn new() -> Self {
        Self {
            language: "eng".to_string(),
            tessdata_prefix: None,
        }
    }

    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self {
            language: settings.tesseract_language.clone(),
            tessdata_prefix: settings.tessdata_prefix.clone(),
        }
    }

    /// Run Tesseract on an image file, returning raw TSV.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let mut cmd = Command::new("tesseract");
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .arg("tsv");
        if let Some(ref prefix) = self.tessdata_prefix {
            cmd.env("TESSDATA_PREFIX", prefix);
        }

        match cmd.output() {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild text lines and the mean word confidence from Tesseract TSV.
///
/// Columns: level page_num block_num par_num line_num word_num left top
/// width height conf text. Words are level 5; conf is -1 for non-words.
pub fn parse_tsv(tsv: &str) -> (String, Option<f64>) {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<String>)> = Vec::new();
    let mut conf_sum = 0.0;
    let mut conf_count = 0usize;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }
        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );

        if let Ok(conf) = cols[10].parse::<f64>() {
            if conf >= 0.0 {
                conf_sum += conf;
                conf_count += 1;
            }
        }

        match lines.last_mut() {
            Some((last_key, words)) if *last_key == key => words.push(text.to_string()),
            _ => lines.push((key, vec![text.to_string()])),
        }
    }

    let text = lines
        .into_iter()
        .map(|(_, words)| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    let confidence = (conf_count > 0).then(|| conf_sum / conf_count as f64);
    (text, confidence)
}

impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            format!("Tesseract is available (language: {})", self.language)
        }
    }

    fn ocr_image(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let tsv = self.run_tesseract(image_path)?;
        let (text, confidence) = parse_tsv(&tsv);
        let elapsed = start.elapsed();

        debug!(
            "tesseract: {} chars, confidence {:?} in {:?}",
            text.len(),
            confidence,
            elapsed
        );

        Ok(OcrResult {
            text,
            confidence,
            backend: OcrBackendType::Tesseract,
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}
