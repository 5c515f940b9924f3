//! Service layer: the extraction cascade, batch orchestration and
//! cross-document verification.
//!
//! Services are independent of the CLI and emit events for progress tracking.

pub mod batch;
pub mod crosscheck;
pub mod extraction;

pub use batch::{extract_document, parse_manifest, BatchError, BatchEvent, BatchOrchestrator};
pub use crosscheck::{compare_names, employment_check, name_similarity, verify};
pub use extraction::{ExtractionCascade, ExtractionError};
