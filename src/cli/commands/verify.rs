//! Batch verification command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;
use tokio::sync::mpsc;

use docverify::config::{Config, FaultPolicy};
use docverify::models::BatchRequest;
use docverify::services::{parse_manifest, BatchEvent, BatchOrchestrator};

use super::helpers::{print_json, read_upload};

/// Extract every document in the manifest, cross-check, and print the
/// batch response. Progress goes to stderr so stdout stays JSON.
pub async fn cmd_verify(
    mut config: Config,
    manifest: &Path,
    files: &[PathBuf],
    workers: Option<usize>,
    abort_on_error: bool,
) -> anyhow::Result<()> {
    let json = tokio::fs::read_to_string(manifest)
        .await
        .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
    let manifest = parse_manifest(&json)?;
    let uploads = files
        .iter()
        .map(|f| read_upload(f))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if let Some(workers) = workers {
        config.batch.workers = workers.max(1);
    }
    if abort_on_error {
        config.batch.fault_policy = FaultPolicy::Abort;
    }

    let orchestrator = BatchOrchestrator::from_config(&config);
    let (event_tx, mut event_rx) = mpsc::channel::<BatchEvent>(100);

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                BatchEvent::DocumentSkipped { filename } => {
                    eprintln!(
                        "  {} {} {}",
                        style("-").yellow(),
                        filename,
                        style("(no uploaded file)").dim()
                    );
                }
                BatchEvent::DocumentStarted { filename, kind } => {
                    eprintln!("  {} {} as {}", style("→").dim(), filename, kind);
                }
                BatchEvent::DocumentCompleted { filename, channel } => {
                    eprintln!(
                        "  {} {} {}",
                        style("✓").green(),
                        filename,
                        style(format!("via {}", channel.as_str())).dim()
                    );
                }
                BatchEvent::DocumentFailed { filename, error } => {
                    eprintln!("  {} {}: {}", style("✗").red(), filename, error);
                }
                BatchEvent::Complete {
                    succeeded,
                    failed,
                    skipped,
                } => {
                    eprintln!(
                        "{} {} extracted, {} failed, {} skipped",
                        style("Batch complete:").bold(),
                        succeeded,
                        failed,
                        skipped
                    );
                }
            }
        }
    });

    let request = BatchRequest {
        manifest,
        files: uploads,
    };
    let result = orchestrator.process(request, event_tx).await;
    let _ = event_handler.await;

    let response = result.map_err(|e| {
        if e.is_decryption() {
            eprintln!(
                "{} correct the password in the manifest and retry",
                style("!").yellow()
            );
        }
        e
    })?;
    print_json(&response)
}
