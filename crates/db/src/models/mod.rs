pub mod evaluation_job;

pub use evaluation_job::{AssessmentMetadata, Counter, EvaluationJob, JobStatus};
