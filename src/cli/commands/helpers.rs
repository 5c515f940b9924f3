//! Shared helper functions for CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use docverify::config::Config;
use docverify::models::{DocumentJob, DocumentKind, ExtractedDocument, UploadedFile};
use docverify::services::{extract_document, ExtractionCascade};

/// Load the explicit config file, or discover one.
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Loading {}", path.display())),
        None => Ok(Config::load().await),
    }
}

/// Read a file as an upload named by its file name.
pub fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?;
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(UploadedFile::new(filename, content))
}

pub fn read_job(
    path: &Path,
    kind: DocumentKind,
    password: Option<String>,
) -> anyhow::Result<DocumentJob> {
    let upload = read_upload(path)?;
    Ok(DocumentJob::new(upload.filename, kind, upload.content).with_password(password))
}

/// Run one document through the cascade on the blocking pool.
pub async fn extract_blocking(
    cascade: Arc<ExtractionCascade>,
    job: DocumentJob,
) -> anyhow::Result<ExtractedDocument> {
    let filename = job.filename.clone();
    let doc = tokio::task::spawn_blocking(move || extract_document(&cascade, &job))
        .await?
        .map_err(|e| {
            if e.is_decryption() {
                eprintln!("{} needs a (correct) password, pass it with --password", filename);
            }
            e
        })?;
    Ok(doc)
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
