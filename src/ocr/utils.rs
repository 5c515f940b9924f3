//! Shared helpers for recognition engines and external tools.

use std::future::Future;
use std::path::Path;

use base64::Engine;
use tokio::runtime::Handle;

use super::backend::OcrError;

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Read an image file and encode it as base64.
pub fn encode_image_base64(image_path: &Path) -> Result<String, OcrError> {
    let image_bytes = std::fs::read(image_path)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&image_bytes))
}

/// Block on an async future from synchronous code.
///
/// Inside a runtime this must be called from a blocking context (e.g. inside
/// `spawn_blocking`). Outside any runtime a current-thread runtime is built
/// for the call.
pub fn block_on_async<F, T>(backend_name: &str, future: F) -> Result<T, OcrError>
where
    F: Future<Output = Result<T, OcrError>>,
{
    if let Ok(handle) = Handle::try_current() {
        return handle.block_on(future);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            OcrError::OcrFailed(format!(
                "Could not start a runtime for {} OCR: {}",
                backend_name, e
            ))
        })?;
    runtime.block_on(future)
}
