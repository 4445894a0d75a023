use bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::Database;

use lectio_db::models::{AssessmentMetadata, Counter, EvaluationJob, JobStatus};
use lectio_evaluation::EvaluationReport;

use super::base::{BaseDao, DaoError, DaoResult};

/// DAO for the evaluation job queue.
///
/// Submission handlers only ever insert and read; every state mutation goes
/// through the claim/complete/fail methods the single worker calls.
pub struct EvaluationJobDao {
    pub base: BaseDao<EvaluationJob>,
    counters: BaseDao<Counter>,
}

impl EvaluationJobDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, EvaluationJob::COLLECTION),
            counters: BaseDao::new(db, Counter::COLLECTION),
        }
    }

    /// Allocates the next value of the named monotonic counter.
    ///
    /// Atomic upserted `$inc`, so concurrent submitters can never share a
    /// sequence number.
    async fn next_seq(&self, name: &str) -> DaoResult<i64> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters
            .collection()
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "value": 1_i64 } })
            .with_options(options)
            .await
            .map_err(DaoError::Mongo)?
            .ok_or_else(|| DaoError::Validation("counter upsert returned nothing".to_string()))?;

        Ok(counter.value)
    }

    /// Persists a new submission with `status: Queued` and returns it.
    pub async fn enqueue(
        &self,
        audio_path: String,
        reference_text: String,
        metadata: AssessmentMetadata,
    ) -> DaoResult<EvaluationJob> {
        let seq = self.next_seq(EvaluationJob::COLLECTION).await?;
        let now = DateTime::now();
        let job = EvaluationJob {
            id: None,
            seq,
            audio_path,
            reference_text,
            status: JobStatus::Queued,
            result: None,
            metadata,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&job).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<EvaluationJob> {
        self.base.find_by_id(id).await
    }

    /// Atomically claims the oldest queued job: the single queued document
    /// with the lowest `seq` flips to `processing` and is returned. `None`
    /// when the queue is empty.
    ///
    /// `find_one_and_update` makes claim-and-mark one operation, so no two
    /// workers could ever observe the same job as claimable.
    pub async fn claim_next(&self) -> DaoResult<Option<EvaluationJob>> {
        let options = FindOneAndUpdateOptions::builder()
            .sort(doc! { "seq": 1 })
            .return_document(ReturnDocument::After)
            .build();

        let job = self
            .base
            .collection()
            .find_one_and_update(
                doc! { "status": "queued" },
                doc! { "$set": {
                    "status": "processing",
                    "updated_at": DateTime::now(),
                } },
            )
            .with_options(options)
            .await
            .map_err(DaoError::Mongo)?;

        Ok(job)
    }

    /// Marks a job completed and stores its report.
    pub async fn complete(&self, id: ObjectId, report: &EvaluationReport) -> DaoResult<bool> {
        let report_bson = bson::to_bson(report)?;
        self.base
            .update_by_id(
                id,
                doc! { "$set": {
                    "status": "completed",
                    "result": report_bson,
                    "updated_at": DateTime::now(),
                } },
            )
            .await
    }

    /// Marks a job failed. No partial report is ever stored.
    pub async fn fail(&self, id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(
                id,
                doc! { "$set": {
                    "status": "failed",
                    "updated_at": DateTime::now(),
                } },
            )
            .await
    }

    /// Number of jobs currently in a given state.
    pub async fn count_with_status(&self, status: JobStatus) -> DaoResult<u64> {
        self.base.count(doc! { "status": status.as_str() }).await
    }
}
