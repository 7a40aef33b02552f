//! Progress event records.

use lexsort_types::AssignmentResult;
use serde::{Deserialize, Serialize};

/// Which stage of a job an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Fetching embeddings from cache/provider
    Embedding,
    /// Streaming target pages against category pages
    Matching,
    /// Classifier training epochs
    Training,
}

/// A single self-contained event record.
///
/// Serialized as one JSON object per line; the `type` field is the
/// discriminator the host uses for demultiplexing. Progress counters are
/// stage-specific: `fetched`/`total` for embedding, `processed`/`total`
/// for matching, `epoch`/`total` for training.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Incremental progress within a stage
    Progress {
        stage: JobStage,
        #[serde(skip_serializing_if = "Option::is_none")]
        fetched: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        processed: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        epoch: Option<u64>,
        total: u64,
        percent: f32,
    },
    /// Informational message
    Info { message: String },
    /// Terminal failure, reported once per job
    Error { message: String, code: String },
    /// Terminal success
    Complete {
        job_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        items: Option<u64>,
    },
    /// A streamed assignment result
    #[serde(rename = "result")]
    Assignment(AssignmentResult),
}

fn percent_of(current: u64, total: u64) -> f32 {
    if total == 0 {
        100.0
    } else {
        (current as f32 / total as f32) * 100.0
    }
}

impl ProgressEvent {
    /// Embedding-stage progress over unique texts requiring fetch.
    pub fn fetch_progress(fetched: u64, total: u64) -> Self {
        ProgressEvent::Progress {
            stage: JobStage::Embedding,
            fetched: Some(fetched),
            processed: None,
            epoch: None,
            total,
            percent: percent_of(fetched, total),
        }
    }

    /// Matching-stage progress over target items.
    pub fn match_progress(processed: u64, total: u64) -> Self {
        ProgressEvent::Progress {
            stage: JobStage::Matching,
            fetched: None,
            processed: Some(processed),
            epoch: None,
            total,
            percent: percent_of(processed, total),
        }
    }

    /// Training-stage progress over epochs.
    pub fn epoch_progress(epoch: u64, total: u64) -> Self {
        ProgressEvent::Progress {
            stage: JobStage::Training,
            fetched: None,
            processed: None,
            epoch: Some(epoch),
            total,
            percent: percent_of(epoch, total),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        ProgressEvent::Info {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn complete(job_id: impl Into<String>, items: Option<u64>) -> Self {
        ProgressEvent::Complete {
            job_id: job_id.into(),
            items,
        }
    }
}
