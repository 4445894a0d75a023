use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use lectio_evaluation::EvaluationReport;

/// Lifecycle of an evaluation job. Terminal states are final; no automatic
/// transition back to `Queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// The wire string for this status ("queued", "processing", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Caller-supplied context stored with a submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentMetadata {
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub grade_level: String,
    #[serde(default)]
    pub text_title: String,
    pub audio_duration_seconds: Option<f64>,
}

/// One queued reading evaluation. Created on submission with
/// `status: Queued`; mutated exclusively by the single queue worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationJob {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Strictly monotonic submission sequence; the worker claims jobs in
    /// ascending `seq` order (strict FIFO).
    pub seq: i64,
    pub audio_path: String,
    pub reference_text: String,
    pub status: JobStatus,
    /// Present only once the job completed.
    pub result: Option<EvaluationReport>,
    #[serde(default)]
    pub metadata: AssessmentMetadata,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl EvaluationJob {
    pub const COLLECTION: &'static str = "evaluation_jobs";
}

/// Monotonic sequence source, one document per named counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub value: i64,
}

impl Counter {
    pub const COLLECTION: &'static str = "counters";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
        let status: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, JobStatus::Failed);
        assert_eq!(status.as_str(), "failed");
    }

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
