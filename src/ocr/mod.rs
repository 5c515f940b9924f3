//! Text recognition, page rasterization and code decoding.
//!
//! - Tesseract (local binary) and PaddleOCR (HTTP serving) recognition engines
//! - An engine chain that falls back from the primary to the secondary engine
//! - Poppler tools for PDF text layers and page images
//! - QR decoding for identity cards

mod backend;
mod fallback;
mod paddle;
mod pdf_utils;
mod qr;
mod tesseract;
mod utils;

pub use backend::{OcrBackend, OcrBackendType, OcrError, OcrResult};
pub use fallback::{EngineChain, EngineOutcome};
pub use paddle::{merge_lines, PaddleBackend};
pub use pdf_utils::{PdfError, PdfInfo, PdfTools, PopplerTools};
pub use qr::{CodeDecoder, CodeError, IdentityPayload, QrDecoder};
pub use tesseract::TesseractBackend;
pub use utils::check_binary;
