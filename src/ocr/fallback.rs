//! Primary/secondary engine chain.
//!
//! Each image walks `NotAttempted -> Primary -> Secondary -> Exhausted`.
//! An engine error or an insufficient result moves to the next state; the
//! secondary engine's output replaces the primary's rather than merging.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::{OcrBackend, OcrBackendType, OcrError, OcrResult};
use super::paddle::PaddleBackend;
use super::tesseract::TesseractBackend;
use crate::config::{OcrSettings, PaddleSettings};
use crate::models::Channel;

/// Where an image is in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    NotAttempted,
    Primary,
    Secondary,
    Exhausted,
}

/// Text recognized for one image, with the engine slot that produced it.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    pub result: OcrResult,
    pub channel: Channel,
}

/// An ordered pair of recognition engines.
pub struct EngineChain {
    primary: Option<Arc<dyn OcrBackend>>,
    secondary: Option<Arc<dyn OcrBackend>>,
    min_chars: usize,
}

impl EngineChain {
    pub fn new(
        primary: Option<Arc<dyn OcrBackend>>,
        secondary: Option<Arc<dyn OcrBackend>>,
        min_chars: usize,
    ) -> Self {
        Self {
            primary,
            secondary,
            min_chars,
        }
    }

    /// Build the chain from `engine_order`, skipping engines that fail to
    /// initialize. A missing Paddle endpoint leaves Tesseract alone.
    pub fn from_settings(ocr: &OcrSettings, paddle: &PaddleSettings) -> Self {
        let mut backends: Vec<Arc<dyn OcrBackend>> = Vec::new();

        for name in &ocr.engine_order {
            match Self::create_backend(name, ocr, paddle) {
                Some(Ok(backend)) => {
                    debug!("OCR engine chain: added {} backend", name);
                    backends.push(backend);
                }
                Some(Err(e)) => warn!("OCR engine chain: {} unavailable: {}", name, e),
                None => warn!("OCR engine chain: unknown backend '{}'", name),
            }
        }

        if backends.is_empty() {
            backends.push(Arc::new(TesseractBackend::from_settings(ocr)));
        }

        info!(
            "OCR engine chain: {}",
            backends
                .iter()
                .map(|b| b.backend_type().to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        let mut backends = backends.into_iter();
        Self::new(backends.next(), backends.next(), ocr.min_engine_chars)
    }

    fn create_backend(
        name: &str,
        ocr: &OcrSettings,
        paddle: &PaddleSettings,
    ) -> Option<Result<Arc<dyn OcrBackend>, OcrError>> {
        match OcrBackendType::from_str(name)? {
            OcrBackendType::Tesseract => {
                Some(Ok(Arc::new(TesseractBackend::from_settings(ocr)) as Arc<dyn OcrBackend>))
            }
            OcrBackendType::PaddleOcr => Some(
                PaddleBackend::from_settings(paddle)
                    .map(|b| Arc::new(b) as Arc<dyn OcrBackend>),
            ),
        }
    }

    /// Engines in the chain, primary first.
    pub fn backends(&self) -> Vec<&Arc<dyn OcrBackend>> {
        self.primary.iter().chain(self.secondary.iter()).collect()
    }

    fn sufficient(&self, result: &OcrResult) -> bool {
        result.significant_chars() >= self.min_chars
    }

    /// Recognize one image, falling back to the secondary engine when the
    /// primary errors or returns too little text.
    pub fn recognize(&self, image: &Path) -> Result<EngineOutcome, OcrError> {
        let mut state = EngineState::NotAttempted;
        let mut short: Option<EngineOutcome> = None;
        let mut last_error: Option<OcrError> = None;

        loop {
            state = match state {
                EngineState::NotAttempted => EngineState::Primary,
                EngineState::Primary => EngineState::Secondary,
                EngineState::Secondary | EngineState::Exhausted => EngineState::Exhausted,
            };

            let (backend, channel) = match state {
                EngineState::Primary => (&self.primary, Channel::PrimaryOcr),
                EngineState::Secondary => (&self.secondary, Channel::SecondaryOcr),
                _ => break,
            };
            let Some(backend) = backend else {
                continue;
            };

            match backend.ocr_image(image) {
                Ok(result) if self.sufficient(&result) => {
                    debug!("OCR succeeded with {} backend", backend.backend_type());
                    return Ok(EngineOutcome { result, channel });
                }
                Ok(result) => {
                    info!(
                        "{} returned {} chars (< {}), trying next engine",
                        backend.backend_type(),
                        result.significant_chars(),
                        self.min_chars
                    );
                    if short.is_none() && result.significant_chars() > 0 {
                        short = Some(EngineOutcome { result, channel });
                    }
                }
                Err(e) => {
                    warn!("OCR backend {} failed: {}", backend.backend_type(), e);
                    last_error = Some(e);
                }
            }
        }

        // Nothing sufficient: a short but non-empty result beats no text.
        if let Some(outcome) = short {
            return Ok(outcome);
        }
        Err(last_error.unwrap_or_else(|| {
            OcrError::OcrFailed(format!("no engine recognized text in {}", image.display()))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        kind: OcrBackendType,
        reply: Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(kind: OcrBackendType, reply: Result<&'static str, &'static str>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl OcrBackend for Scripted {
        fn backend_type(&self) -> OcrBackendType {
            self.kind
        }
        fn is_available(&self) -> bool {
            true
        }
        fn availability_hint(&self) -> String {
            String::new()
        }
        fn ocr_image(&self, _image_path: &Path) -> Result<OcrResult, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Ok(text) => Ok(OcrResult {
                    text: text.to_string(),
                    confidence: Some(90.0),
                    backend: self.kind,
                    processing_time_ms: 0,
                }),
                Err(msg) => Err(OcrError::OcrFailed(msg.to_string())),
            }
        }
    }

    #[test]
    fn test_primary_sufficient_skips_secondary() {
        let primary = Scripted::new(OcrBackendType::PaddleOcr, Ok("Net Salary 50,000.00"));
        let secondary = Scripted::new(OcrBackendType::Tesseract, Ok("unused text here"));
        let chain = EngineChain::new(Some(primary.clone()), Some(secondary.clone()), 10);

        let outcome = chain.recognize(Path::new("page.png")).unwrap();
        assert_eq!(outcome.channel, Channel::PrimaryOcr);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_short_primary_replaced_by_secondary() {
        let primary = Scripted::new(OcrBackendType::PaddleOcr, Ok("abc"));
        let secondary = Scripted::new(OcrBackendType::Tesseract, Ok("Account No 1234567890"));
        let chain = EngineChain::new(Some(primary), Some(secondary), 10);

        let outcome = chain.recognize(Path::new("page.png")).unwrap();
        assert_eq!(outcome.channel, Channel::SecondaryOcr);
        assert_eq!(outcome.result.text, "Account No 1234567890");
    }

    #[test]
    fn test_primary_error_falls_back() {
        let primary = Scripted::new(OcrBackendType::PaddleOcr, Err("connection refused"));
        let secondary = Scripted::new(OcrBackendType::Tesseract, Ok("Employee Name: John Doe"));
        let chain = EngineChain::new(Some(primary), Some(secondary), 10);

        let outcome = chain.recognize(Path::new("page.png")).unwrap();
        assert_eq!(outcome.result.backend, OcrBackendType::Tesseract);
    }

    #[test]
    fn test_short_text_kept_when_secondary_fails() {
        let primary = Scripted::new(OcrBackendType::PaddleOcr, Ok("A B"));
        let secondary = Scripted::new(OcrBackendType::Tesseract, Err("boom"));
        let chain = EngineChain::new(Some(primary), Some(secondary), 10);

        let outcome = chain.recognize(Path::new("page.png")).unwrap();
        assert_eq!(outcome.result.text, "A B");
        assert_eq!(outcome.channel, Channel::PrimaryOcr);
    }

    #[test]
    fn test_exhausted_returns_last_error() {
        let primary = Scripted::new(OcrBackendType::PaddleOcr, Err("first"));
        let secondary = Scripted::new(OcrBackendType::Tesseract, Err("second"));
        let chain = EngineChain::new(Some(primary), Some(secondary), 10);

        let err = chain.recognize(Path::new("page.png")).unwrap_err();
        assert!(err.to_string().contains("second"));
    }

    #[test]
    fn test_single_engine_chain() {
        let only = Scripted::new(OcrBackendType::Tesseract, Ok("Sufficient text"));
        let chain = EngineChain::new(Some(only), None, 10);
        assert_eq!(chain.backends().len(), 1);
        assert!(chain.recognize(Path::new("page.png")).is_ok());
    }

    #[test]
    fn test_from_settings_degrades_without_paddle() {
        let ocr = OcrSettings::default();
        let paddle = PaddleSettings {
            enabled: false,
            ..Default::default()
        };
        let chain = EngineChain::from_settings(&ocr, &paddle);
        let kinds: Vec<_> = chain.backends().iter().map(|b| b.backend_type()).collect();
        assert_eq!(kinds, vec![OcrBackendType::Tesseract]);
    }
}
