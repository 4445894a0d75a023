//! Queue-semantics tests against a live MongoDB (ignored by default).

use lectio_db::models::{AssessmentMetadata, JobStatus};
use lectio_evaluation::report::{
    AccuracyBlock, ErrorBreakdown, EvaluationReport, FluencyBlock, OverallGrade,
};
use lectio_services::dao::EvaluationJobDao;

use crate::support::test_database;

fn sample_report() -> EvaluationReport {
    EvaluationReport {
        transcription: "the cat sat on the mat".to_string(),
        detected_language: "en".to_string(),
        accuracy: AccuracyBlock {
            word_error_rate: 0.0,
            character_error_rate: 0.0,
            word_accuracy: 100.0,
        },
        fluency: FluencyBlock {
            reading_speed_wpm: 120.0,
            pause_count: 1,
            total_pause_duration: 0.5,
            average_pause_duration: 0.5,
        },
        errors: ErrorBreakdown::default(),
        overall_grade: OverallGrade {
            accuracy_grade: 'A',
            speed_grade: 'B',
            overall_score: 80.0,
        },
        feedback: vec!["Excellent accuracy! You read almost perfectly.".to_string()],
    }
}

async fn enqueue_n(dao: &EvaluationJobDao, n: usize) -> Vec<i64> {
    let mut seqs = Vec::new();
    for i in 0..n {
        let job = dao
            .enqueue(
                format!("/tmp/audio_{i}.wav"),
                format!("reference text number {i}"),
                AssessmentMetadata::default(),
            )
            .await
            .unwrap();
        seqs.push(job.seq);
    }
    seqs
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn claims_follow_submission_order() {
    let db = test_database().await;
    let dao = EvaluationJobDao::new(&db);

    let seqs = enqueue_n(&dao, 3).await;
    assert!(seqs.windows(2).all(|w| w[0] < w[1]), "seq must be monotonic");

    for expected_seq in seqs {
        let claimed = dao.claim_next().await.unwrap().expect("job available");
        assert_eq!(claimed.seq, expected_seq);
        assert_eq!(claimed.status, JobStatus::Processing);
        // Terminate before the next claim, as the single worker does.
        dao.fail(claimed.id.unwrap()).await.unwrap();
    }

    assert!(dao.claim_next().await.unwrap().is_none());
    db.drop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn at_most_one_job_processing() {
    let db = test_database().await;
    let dao = EvaluationJobDao::new(&db);

    enqueue_n(&dao, 4).await;

    // Claim twice without terminating: two distinct jobs flip to
    // processing, and no job is ever handed out twice.
    let first = dao.claim_next().await.unwrap().unwrap();
    let second = dao.claim_next().await.unwrap().unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(dao.count_with_status(JobStatus::Processing).await.unwrap(), 2);
    assert_eq!(dao.count_with_status(JobStatus::Queued).await.unwrap(), 2);

    db.drop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn terminal_transitions_persist() {
    let db = test_database().await;
    let dao = EvaluationJobDao::new(&db);

    enqueue_n(&dao, 2).await;

    let completed = dao.claim_next().await.unwrap().unwrap();
    dao.complete(completed.id.unwrap(), &sample_report())
        .await
        .unwrap();
    let reloaded = dao.find_by_id(completed.id.unwrap()).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Completed);
    let report = reloaded.result.expect("completed job stores its report");
    assert_eq!(report.detected_language, "en");
    assert_eq!(report.overall_grade.accuracy_grade, 'A');

    let failed = dao.claim_next().await.unwrap().unwrap();
    dao.fail(failed.id.unwrap()).await.unwrap();
    let reloaded = dao.find_by_id(failed.id.unwrap()).await.unwrap();
    assert_eq!(reloaded.status, JobStatus::Failed);
    // A failed job never carries a partial report.
    assert!(reloaded.result.is_none());

    db.drop().await.unwrap();
}
