//! Batch orchestration.
//!
//! Every manifest entry with matching uploaded content becomes one blocking
//! extraction task. Tasks run at most `workers` at a time and each returns its
//! own outcome; the orchestrator joins them all before assembling records,
//! failures and the cross-check verdict.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::crosscheck;
use super::extraction::{ExtractionCascade, ExtractionError};
use crate::config::{BatchSettings, Config, FaultPolicy};
use crate::models::{
    BatchRequest, BatchResponse, Channel, DocumentFailure, DocumentJob, DocumentKind,
    ExtractedDocument, Manifest, RecordSet, UploadedFile,
};
use crate::parsers::parse_record;

/// Batch-level failures.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("No uploaded file matches any manifest entry")]
    NoDocuments,

    #[error("{filename}: {source}")]
    Document {
        filename: String,
        source: ExtractionError,
    },
}

impl BatchError {
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Document { source, .. } if source.is_decryption())
    }
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Manifest entry without uploaded content.
    DocumentSkipped { filename: String },
    DocumentStarted {
        filename: String,
        kind: DocumentKind,
    },
    DocumentCompleted {
        filename: String,
        channel: Channel,
    },
    DocumentFailed { filename: String, error: String },
    Complete {
        succeeded: usize,
        failed: usize,
        skipped: usize,
    },
}

/// Parse a manifest, rejecting one that declares nothing.
pub fn parse_manifest(json: &str) -> Result<Manifest, BatchError> {
    let manifest =
        Manifest::from_json(json).map_err(|e| BatchError::InvalidManifest(e.to_string()))?;
    if manifest.documents.is_empty() {
        return Err(BatchError::InvalidManifest(
            "manifest declares no documents".to_string(),
        ));
    }
    Ok(manifest)
}

/// Pair manifest entries with uploads by filename. Entries without content
/// are returned separately; uploads the manifest does not mention are ignored.
pub fn plan_jobs(request: BatchRequest) -> (Vec<DocumentJob>, Vec<String>) {
    let mut uploads: HashMap<String, UploadedFile> = request
        .files
        .into_iter()
        .map(|f| (f.filename.clone(), f))
        .collect();

    let mut jobs = Vec::with_capacity(request.manifest.documents.len());
    let mut skipped = Vec::new();
    for entry in request.manifest.documents {
        // The same upload may be declared more than once.
        let content = match uploads.get(&entry.filename) {
            Some(file) => file.content.clone(),
            None => {
                warn!("No uploaded file for manifest entry {}, skipping", entry.filename);
                skipped.push(entry.filename);
                continue;
            }
        };
        jobs.push(
            DocumentJob::new(entry.filename, entry.doc_type, content).with_password(entry.password),
        );
    }

    uploads.retain(|name, _| !jobs.iter().any(|j| &j.filename == name));
    for name in uploads.keys() {
        debug!("Upload {} is not in the manifest, ignoring", name);
    }

    (jobs, skipped)
}

/// Extract and parse one document.
pub fn extract_document(
    cascade: &ExtractionCascade,
    job: &DocumentJob,
) -> Result<ExtractedDocument, ExtractionError> {
    let extraction = cascade.extract(job)?;
    Ok(ExtractedDocument {
        filename: job.filename.clone(),
        source_sha256: job.fingerprint(),
        channel: extraction.channel,
        record: parse_record(job.kind, &extraction),
    })
}

struct JobOutcome {
    filename: String,
    kind: DocumentKind,
    result: Result<ExtractedDocument, ExtractionError>,
}

/// Runs the cascade over every document of a batch.
pub struct BatchOrchestrator {
    cascade: Arc<ExtractionCascade>,
    settings: BatchSettings,
}

impl BatchOrchestrator {
    pub fn new(cascade: Arc<ExtractionCascade>, settings: BatchSettings) -> Self {
        Self { cascade, settings }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(ExtractionCascade::from_config(config)),
            config.batch.clone(),
        )
    }

    pub fn cascade(&self) -> &Arc<ExtractionCascade> {
        &self.cascade
    }

    /// Process a batch request.
    ///
    /// Under [`FaultPolicy::Partial`] failed documents are annotated in the
    /// response; under [`FaultPolicy::Abort`] the first failure in manifest
    /// order fails the batch. Either way every task is joined first.
    pub async fn process(
        &self,
        request: BatchRequest,
        event_tx: mpsc::Sender<BatchEvent>,
    ) -> Result<BatchResponse, BatchError> {
        if request.manifest.documents.is_empty() {
            return Err(BatchError::InvalidManifest(
                "manifest declares no documents".to_string(),
            ));
        }

        let (jobs, skipped) = plan_jobs(request);
        for filename in &skipped {
            let _ = event_tx
                .send(BatchEvent::DocumentSkipped {
                    filename: filename.clone(),
                })
                .await;
        }
        if jobs.is_empty() {
            return Err(BatchError::NoDocuments);
        }

        info!(
            "Processing batch of {} documents ({} skipped) with {} workers",
            jobs.len(),
            skipped.len(),
            self.settings.workers
        );
        let outcomes = self.run_jobs(jobs, &event_tx).await;

        let mut records = RecordSet::default();
        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(doc) => {
                    records.push(doc.record.clone());
                    documents.push(doc);
                }
                Err(source) if self.settings.fault_policy == FaultPolicy::Abort => {
                    warn!("Aborting batch: {} failed: {}", outcome.filename, source);
                    return Err(BatchError::Document {
                        filename: outcome.filename,
                        source,
                    });
                }
                Err(e) => failures.push(DocumentFailure {
                    filename: outcome.filename,
                    kind: outcome.kind,
                    decryption: e.is_decryption(),
                    error: e.to_string(),
                }),
            }
        }

        let _ = event_tx
            .send(BatchEvent::Complete {
                succeeded: documents.len(),
                failed: failures.len(),
                skipped: skipped.len(),
            })
            .await;

        let mut cross_check =
            crosscheck::verify(&records.salary_slips, &records.bank_statements);
        cross_check.employment =
            crosscheck::employment_check(&records.employee_ids, &records.appointment_letters);

        Ok(BatchResponse {
            batch_id: Uuid::new_v4(),
            processed_at: Utc::now(),
            records,
            documents,
            cross_check,
            failures,
            skipped,
            min_quality_score: self.cascade.settings().quality_floor,
        })
    }

    /// Run every job on the blocking pool, `workers` at a time, returning
    /// outcomes in job order.
    async fn run_jobs(
        &self,
        jobs: Vec<DocumentJob>,
        event_tx: &mpsc::Sender<BatchEvent>,
    ) -> Vec<JobOutcome> {
        let workers = self.settings.workers.max(1);
        let mut outcomes = Vec::with_capacity(jobs.len());
        let mut handles = Vec::with_capacity(workers);

        for job in jobs {
            let cascade = self.cascade.clone();
            let event_tx = event_tx.clone();
            let filename = job.filename.clone();
            let kind = job.kind;

            let handle = tokio::task::spawn_blocking(move || {
                let _ = futures::executor::block_on(event_tx.send(BatchEvent::DocumentStarted {
                    filename: job.filename.clone(),
                    kind: job.kind,
                }));

                let result = extract_document(&cascade, &job);
                let event = match &result {
                    Ok(doc) => BatchEvent::DocumentCompleted {
                        filename: job.filename.clone(),
                        channel: doc.channel,
                    },
                    Err(e) => {
                        warn!("Extraction failed for {}: {}", job.filename, e);
                        BatchEvent::DocumentFailed {
                            filename: job.filename.clone(),
                            error: e.to_string(),
                        }
                    }
                };
                let _ = futures::executor::block_on(event_tx.send(event));
                result
            });
            handles.push((filename, kind, handle));

            if handles.len() >= workers {
                for (filename, kind, h) in handles.drain(..) {
                    outcomes.push(join_outcome(filename, kind, h.await));
                }
            }
        }

        for (filename, kind, h) in handles {
            outcomes.push(join_outcome(filename, kind, h.await));
        }
        outcomes
    }
}

fn join_outcome(
    filename: String,
    kind: DocumentKind,
    joined: Result<Result<ExtractedDocument, ExtractionError>, tokio::task::JoinError>,
) -> JobOutcome {
    let result = joined.unwrap_or_else(|e| {
        warn!("Extraction task for {} did not complete: {}", filename, e);
        Err(ExtractionError::Io(std::io::Error::other(format!(
            "extraction task did not complete: {}",
            e
        ))))
    });
    JobOutcome {
        filename,
        kind,
        result,
    }
}
