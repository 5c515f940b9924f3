//! Per-document extraction cascade.
//!
//! For one document the cascade tries, in order:
//! 1. the PDF text layer (accepted if long enough for the document kind)
//! 2. rasterized pages, decoding a QR code first for identity cards
//! 3. OCR of every page through the engine chain
//!
//! Identity cards are rasterized even behind an accepted text layer, since
//! a decoded identity payload outranks any printed text.
//!
//! All intermediate files live in a scratch directory owned by the call and
//! removed when it returns, whichever path it returns through.

pub mod quality;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ExtractionSettings};
use crate::models::{Channel, DocumentJob, ExtractionResult, QualityIssue, PAGE_BREAK};
use crate::ocr::{
    CodeDecoder, EngineChain, IdentityPayload, OcrError, PdfError, PdfInfo, PdfTools,
    PopplerTools, QrDecoder,
};

/// Terminal failures for one document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Decryption failed: {0}")]
    Decryption(PdfError),

    #[error("No text could be extracted from {filename}")]
    Exhausted { filename: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),
}

impl ExtractionError {
    /// Wrong or missing password; the caller can retry with a corrected one.
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption(_))
    }
}

/// Runs the cascade for single documents or image sets.
pub struct ExtractionCascade {
    pdf: Arc<dyn PdfTools>,
    engines: EngineChain,
    codes: Arc<dyn CodeDecoder>,
    settings: ExtractionSettings,
}

/// Text recognized across a set of pages.
struct PageTexts {
    texts: Vec<String>,
    confidences: Vec<f64>,
    used_secondary: bool,
}

impl ExtractionCascade {
    pub fn new(
        pdf: Arc<dyn PdfTools>,
        engines: EngineChain,
        codes: Arc<dyn CodeDecoder>,
        settings: ExtractionSettings,
    ) -> Self {
        Self {
            pdf,
            engines,
            codes,
            settings,
        }
    }

    /// Poppler, the configured engine chain and the QR decoder.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(PopplerTools::new(config.extraction.raster_dpi)),
            EngineChain::from_settings(&config.ocr, &config.paddle),
            Arc::new(QrDecoder),
            config.extraction.clone(),
        )
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    pub fn engines(&self) -> &EngineChain {
        &self.engines
    }

    /// Extract text from one document.
    pub fn extract(&self, job: &DocumentJob) -> Result<ExtractionResult, ExtractionError> {
        let format = job
            .format()
            .ok_or_else(|| ExtractionError::UnsupportedFormat(job.filename.clone()))?;
        let scratch = scratch_dir()?;
        let input = write_input(job, scratch.path())?;

        debug!("Extracting {} as {:?} ({:?})", job.filename, job.kind, format);
        if format.is_pdf() {
            self.extract_pdf(job, &input, scratch.path())
        } else {
            self.recognize_images(job, &[input], BTreeSet::new())
        }
    }

    /// Extract one logical document uploaded as several images (front and
    /// back of a card). Codes are tried on every image in upload order; OCR
    /// text of all images is concatenated.
    pub fn extract_images(&self, jobs: &[DocumentJob]) -> Result<ExtractionResult, ExtractionError> {
        let first = jobs
            .first()
            .ok_or_else(|| ExtractionError::UnsupportedFormat("no images supplied".to_string()))?;

        let scratch = scratch_dir()?;
        let mut images = Vec::with_capacity(jobs.len());
        for (i, job) in jobs.iter().enumerate() {
            match job.format() {
                Some(format) if !format.is_pdf() => {}
                _ => return Err(ExtractionError::UnsupportedFormat(job.filename.clone())),
            }
            let dir = scratch.path().join(format!("image-{}", i));
            std::fs::create_dir(&dir)?;
            images.push(write_input(job, &dir)?);
        }

        self.recognize_images(first, &images, BTreeSet::new())
    }

    fn extract_pdf(
        &self,
        job: &DocumentJob,
        input: &Path,
        scratch: &Path,
    ) -> Result<ExtractionResult, ExtractionError> {
        let password = job.password.as_deref();
        let mut issues = BTreeSet::new();

        let info = match self.pdf.inspect(input, password) {
            Ok(info) => info,
            Err(e) if e.is_password_error() => return Err(ExtractionError::Decryption(e)),
            Err(e) => {
                warn!("Could not inspect {}: {}", job.filename, e);
                PdfInfo::default()
            }
        };
        if password.is_some() && !info.encrypted {
            debug!("{}: password supplied but document is not encrypted", job.filename);
        }

        let mut layer_text = String::new();
        match self.pdf.text_layer(input, password) {
            Ok(text) if quality::accepts_text_layer(job.kind, &text, &self.settings) => {
                if job.kind.carries_code() {
                    if let Some(result) = self.code_behind_text_layer(job, input, scratch)? {
                        return Ok(result);
                    }
                }
                info!("{}: using embedded text layer", job.filename);
                return Ok(ExtractionResult {
                    text: text.trim().to_string(),
                    confidence: None,
                    quality: quality::direct_quality(issues),
                    channel: Channel::TextLayer,
                    page_count: info.pages.max(1) as usize,
                });
            }
            Ok(text) => {
                debug!(
                    "{}: text layer too thin ({} chars), rasterizing",
                    job.filename,
                    text.trim().chars().count()
                );
                layer_text = text.trim().to_string();
            }
            Err(e) if e.is_password_error() => return Err(ExtractionError::Decryption(e)),
            Err(e) => {
                warn!("{}: text layer extraction failed: {}", job.filename, e);
                issues.insert(QualityIssue::PdfTextExtractionFailed);
            }
        }

        let pages_dir = scratch.join("pages");
        std::fs::create_dir(&pages_dir)?;
        let pages = match self.pdf.rasterize(input, password, &pages_dir) {
            Ok(pages) => pages,
            Err(e) if e.is_password_error() => return Err(ExtractionError::Decryption(e)),
            Err(e) => {
                warn!("{}: rasterization failed: {}", job.filename, e);
                issues.insert(QualityIssue::PdfImageExtractionFailed);
                return self.thin_text_layer(job, layer_text, info, issues);
            }
        };

        match self.recognize_images(job, &pages, issues.clone()) {
            Err(ExtractionError::Exhausted { .. }) if !layer_text.is_empty() => {
                issues.insert(QualityIssue::ScannedPdfOcrFailed);
                self.thin_text_layer(job, layer_text, info, issues)
            }
            other => other,
        }
    }

    /// Rasterize only to look for a code. Nothing is OCR'd here; without a
    /// code the caller keeps the text layer.
    fn code_behind_text_layer(
        &self,
        job: &DocumentJob,
        input: &Path,
        scratch: &Path,
    ) -> Result<Option<ExtractionResult>, ExtractionError> {
        let pages_dir = scratch.join("pages");
        std::fs::create_dir(&pages_dir)?;
        match self.pdf.rasterize(input, job.password.as_deref(), &pages_dir) {
            Ok(pages) => Ok(self.decode_code(job, &pages)),
            Err(e) if e.is_password_error() => Err(ExtractionError::Decryption(e)),
            Err(e) => {
                warn!("{}: could not rasterize to look for a code: {}", job.filename, e);
                Ok(None)
            }
        }
    }

    /// Fall back to a short text layer when no page yielded anything better.
    fn thin_text_layer(
        &self,
        job: &DocumentJob,
        text: String,
        info: PdfInfo,
        issues: BTreeSet<QualityIssue>,
    ) -> Result<ExtractionResult, ExtractionError> {
        if text.is_empty() {
            return Err(ExtractionError::Exhausted {
                filename: job.filename.clone(),
            });
        }
        info!("{}: falling back to short text layer", job.filename);
        Ok(ExtractionResult {
            text,
            confidence: None,
            quality: quality::direct_quality(issues),
            channel: Channel::TextLayer,
            page_count: info.pages.max(1) as usize,
        })
    }

    /// Order in which pages are tried for a code: the configured identity
    /// page first (or page 0 for single-page scans), then the rest in order.
    fn code_page_order(&self, page_count: usize) -> Vec<usize> {
        let preferred = if self.settings.identity_page_index < page_count {
            self.settings.identity_page_index
        } else {
            0
        };
        std::iter::once(preferred)
            .chain((0..page_count).filter(|i| *i != preferred))
            .collect()
    }

    fn recognize_images(
        &self,
        job: &DocumentJob,
        images: &[PathBuf],
        mut issues: BTreeSet<QualityIssue>,
    ) -> Result<ExtractionResult, ExtractionError> {
        if job.kind.carries_code() {
            if let Some(result) = self.decode_code(job, images) {
                return Ok(result);
            }
        }

        let pages = self.ocr_pages(job, images, &mut issues);
        if pages.texts.is_empty() {
            warn!("{}: every extraction channel came back empty", job.filename);
            return Err(ExtractionError::Exhausted {
                filename: job.filename.clone(),
            });
        }

        let confidence = quality::mean_confidence(&pages.confidences);
        let channel = if pages.used_secondary {
            Channel::SecondaryOcr
        } else {
            Channel::PrimaryOcr
        };
        let text = pages.texts.join(PAGE_BREAK);
        debug!("{}: recognized text:\n{}", job.filename, text);

        Ok(ExtractionResult {
            text,
            confidence,
            quality: quality::ocr_quality(confidence, &self.settings, issues),
            channel,
            page_count: images.len(),
        })
    }

    /// First page whose code decodes to an identity payload. Codes carrying
    /// anything else (a URL, a signed numeric payload) count as no code.
    fn decode_code(&self, job: &DocumentJob, images: &[PathBuf]) -> Option<ExtractionResult> {
        for idx in self.code_page_order(images.len()) {
            let payload = match self.codes.decode(&images[idx]) {
                Ok(payload) => payload,
                Err(e) => {
                    debug!("{}: no code on page {}: {}", job.filename, idx + 1, e);
                    continue;
                }
            };
            if let Err(e) = IdentityPayload::parse(&payload) {
                debug!(
                    "{}: code on page {} is not an identity payload: {}",
                    job.filename,
                    idx + 1,
                    e
                );
                continue;
            }

            info!("{}: QR code decoded on page {}", job.filename, idx + 1);
            return Some(ExtractionResult {
                text: payload,
                confidence: None,
                quality: quality::direct_quality(BTreeSet::new()),
                channel: Channel::Code,
                page_count: images.len(),
            });
        }
        None
    }

    /// OCR every page; a failed page is tagged and skipped.
    fn ocr_pages(
        &self,
        job: &DocumentJob,
        images: &[PathBuf],
        issues: &mut BTreeSet<QualityIssue>,
    ) -> PageTexts {
        let mut pages = PageTexts {
            texts: Vec::with_capacity(images.len()),
            confidences: Vec::new(),
            used_secondary: false,
        };

        for (i, image) in images.iter().enumerate() {
            match self.engines.recognize(image) {
                Ok(outcome) => {
                    let text = outcome.result.text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    pages.texts.push(text.to_string());
                    if let Some(conf) = outcome.result.confidence {
                        pages.confidences.push(conf);
                    }
                    pages.used_secondary |= outcome.channel == Channel::SecondaryOcr;
                }
                Err(e) => {
                    warn!("{}: OCR failed on page {}: {}", job.filename, i + 1, e);
                    issues.insert(QualityIssue::PageOcrFailed);
                }
            }
        }
        pages
    }
}

fn scratch_dir() -> Result<tempfile::TempDir, ExtractionError> {
    Ok(tempfile::Builder::new().prefix("docverify-").tempdir()?)
}

/// Write the job's bytes into `dir`, named by its detected format.
fn write_input(job: &DocumentJob, dir: &Path) -> Result<PathBuf, ExtractionError> {
    let ext = job.format().map(|f| f.extension()).unwrap_or("bin");
    let path = dir.join(format!("input.{}", ext));
    std::fs::write(&path, &job.content)?;
    Ok(path)
}
