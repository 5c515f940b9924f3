//! Fake PDF tools, recognition engines and code decoders for driving the
//! cascade without Poppler, Tesseract or a PaddleOCR endpoint.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docverify::config::ExtractionSettings;
use docverify::ocr::{
    CodeDecoder, CodeError, EngineChain, OcrBackend, OcrBackendType, OcrError, OcrResult,
    PdfError, PdfInfo, PdfTools,
};
use docverify::services::ExtractionCascade;

pub const PDF_BYTES: &[u8] = b"%PDF-1.4 fake document";

/// PNG magic followed by a payload the fakes read back.
pub fn png_bytes(payload: &str) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(payload.as_bytes());
    bytes
}

/// Payload of an identity-card code, as a page would carry it.
pub fn qr_page(xml: &str) -> String {
    format!("QR:{}", xml)
}

pub const IDENTITY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PrintLetterBarcodeData uid="987654321098" name="Anita Devi" gender="F" dob="12/03/1988" co="W/O Suresh Kumar" house="4" street="Station Road" vtc="Patna" dist="Patna" state="Bihar" pc="800001"/>"#;

/// In-memory stand-in for Poppler. Pages are written as files whose content
/// is the page text, so the other fakes can read them back.
#[derive(Default)]
pub struct FakePdf {
    pub text_layer: String,
    pub pages: Vec<String>,
    pub password: Option<String>,
    pub fail_rasterize: bool,
    pub rasterize_calls: AtomicUsize,
    pub raster_dirs: Mutex<Vec<PathBuf>>,
}

impl FakePdf {
    pub fn with_text_layer(text: &str) -> Self {
        Self {
            text_layer: text.to_string(),
            pages: vec![text.to_string()],
            ..Default::default()
        }
    }

    pub fn scanned(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn locked(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn rasterize_calls(&self) -> usize {
        self.rasterize_calls.load(Ordering::SeqCst)
    }

    pub fn raster_dirs(&self) -> Vec<PathBuf> {
        self.raster_dirs.lock().unwrap().clone()
    }

    fn unlock(&self, given: Option<&str>) -> Result<(), PdfError> {
        match (self.password.as_deref(), given) {
            (None, _) => Ok(()),
            (Some(_), None) => Err(PdfError::PasswordRequired),
            (Some(expected), Some(given)) if expected == given => Ok(()),
            _ => Err(PdfError::IncorrectPassword),
        }
    }
}

impl PdfTools for FakePdf {
    fn inspect(&self, _pdf: &Path, password: Option<&str>) -> Result<PdfInfo, PdfError> {
        self.unlock(password)?;
        Ok(PdfInfo {
            pages: self.pages.len() as u32,
            encrypted: self.password.is_some(),
        })
    }

    fn text_layer(&self, _pdf: &Path, password: Option<&str>) -> Result<String, PdfError> {
        self.unlock(password)?;
        Ok(self.text_layer.clone())
    }

    fn rasterize(
        &self,
        _pdf: &Path,
        password: Option<&str>,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, PdfError> {
        self.unlock(password)?;
        self.rasterize_calls.fetch_add(1, Ordering::SeqCst);
        self.raster_dirs.lock().unwrap().push(out_dir.to_path_buf());
        if self.fail_rasterize {
            return Err(PdfError::Failed {
                tool: "pdftoppm",
                message: "rendering failed".to_string(),
            });
        }

        let mut paths = Vec::new();
        for (i, page) in self.pages.iter().enumerate() {
            let path = out_dir.join(format!("page-{}.png", i + 1));
            std::fs::write(&path, png_bytes(page))?;
            paths.push(path);
        }
        Ok(paths)
    }
}

/// What a fake engine does with an image.
pub enum Reply {
    /// Return the text stored in the image file.
    Echo,
    /// Return fixed text regardless of the image.
    Fixed(&'static str),
    Fail,
}

pub struct FakeEngine {
    kind: OcrBackendType,
    reply: Reply,
    pub confidence: Option<f64>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<PathBuf>>,
}

impl FakeEngine {
    pub fn new(kind: OcrBackendType, reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply,
            confidence: Some(90.0),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrBackend for FakeEngine {
    fn backend_type(&self) -> OcrBackendType {
        self.kind
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "fake engine".to_string()
    }

    fn ocr_image(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(image_path.to_path_buf());
        let text = match &self.reply {
            Reply::Echo => {
                let bytes = std::fs::read(image_path)?;
                String::from_utf8_lossy(&bytes[8.min(bytes.len())..]).to_string()
            }
            Reply::Fixed(text) => text.to_string(),
            Reply::Fail => return Err(OcrError::OcrFailed("engine crashed".to_string())),
        };
        Ok(OcrResult {
            text,
            confidence: self.confidence,
            backend: self.kind,
            processing_time_ms: 1,
        })
    }
}

/// Finds a `QR:` marker in the image file and returns what follows it.
#[derive(Default)]
pub struct FakeCodes {
    pub calls: AtomicUsize,
}

impl CodeDecoder for FakeCodes {
    fn decode(&self, image: &Path) -> Result<String, CodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = std::fs::read(image).map_err(|e| CodeError::Image(e.to_string()))?;
        let content = String::from_utf8_lossy(&bytes).to_string();
        content
            .split_once("QR:")
            .map(|(_, payload)| payload.to_string())
            .ok_or(CodeError::NotFound)
    }
}

pub fn cascade(
    pdf: Arc<FakePdf>,
    primary: Option<Arc<FakeEngine>>,
    secondary: Option<Arc<FakeEngine>>,
    codes: Arc<FakeCodes>,
) -> ExtractionCascade {
    let primary = primary.map(|e| e as Arc<dyn OcrBackend>);
    let secondary = secondary.map(|e| e as Arc<dyn OcrBackend>);
    ExtractionCascade::new(
        pdf,
        EngineChain::new(primary, secondary, 10),
        codes,
        ExtractionSettings::default(),
    )
}
