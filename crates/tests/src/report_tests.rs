//! Wire-contract tests for the report and job documents.

use bson::oid::ObjectId;
use lectio_db::models::{AssessmentMetadata, EvaluationJob, JobStatus};
use lectio_evaluation::report::{
    AccuracyBlock, ErrorBreakdown, EvaluationReport, FluencyBlock, OverallGrade,
};

fn sample_report() -> EvaluationReport {
    EvaluationReport {
        transcription: "the cat sit on the mat".to_string(),
        detected_language: "en".to_string(),
        accuracy: AccuracyBlock {
            word_error_rate: 16.67,
            character_error_rate: 4.55,
            word_accuracy: 83.33,
        },
        fluency: FluencyBlock {
            reading_speed_wpm: 95.0,
            pause_count: 2,
            total_pause_duration: 1.2,
            average_pause_duration: 0.6,
        },
        errors: ErrorBreakdown {
            substitutions: vec![("sat".to_string(), "sit".to_string())],
            insertions: vec![],
            deletions: vec![],
            correct: vec!["the".into(), "cat".into(), "on".into(), "the".into(), "mat".into()],
        },
        overall_grade: OverallGrade {
            accuracy_grade: 'B',
            speed_grade: 'C',
            overall_score: 65.4,
        },
        feedback: vec![
            "Good accuracy! Minor improvements needed.".to_string(),
            "Reading speed needs improvement.".to_string(),
            "Commonly mispronounced words: sat".to_string(),
        ],
    }
}

#[test]
fn report_wire_shape_is_stable() {
    let json = serde_json::to_value(sample_report()).unwrap();

    assert_eq!(json["transcription"], "the cat sit on the mat");
    assert_eq!(json["detected_language"], "en");
    assert_eq!(json["accuracy"]["word_error_rate"], 16.67);
    assert_eq!(json["accuracy"]["word_accuracy"], 83.33);
    assert_eq!(json["fluency"]["pause_count"], 2);
    assert_eq!(json["errors"]["substitutions"][0][0], "sat");
    assert_eq!(json["errors"]["substitutions"][0][1], "sit");
    assert_eq!(json["overall_grade"]["accuracy_grade"], "B");
    assert_eq!(json["overall_grade"]["overall_score"], 65.4);
    assert_eq!(json["feedback"].as_array().unwrap().len(), 3);
}

#[test]
fn job_document_round_trips_through_bson() {
    let now = bson::DateTime::now();
    let job = EvaluationJob {
        id: Some(ObjectId::new()),
        seq: 7,
        audio_path: "queued_audio/abc.wav".to_string(),
        reference_text: "The cat sat on the mat".to_string(),
        status: JobStatus::Completed,
        result: Some(sample_report()),
        metadata: AssessmentMetadata {
            student_name: "Asha".to_string(),
            grade_level: "3".to_string(),
            text_title: "The Cat".to_string(),
            audio_duration_seconds: Some(14.2),
        },
        created_at: now,
        updated_at: now,
    };

    let doc = bson::to_document(&job).unwrap();
    assert_eq!(doc.get_str("status").unwrap(), "completed");
    assert_eq!(doc.get_i64("seq").unwrap(), 7);

    let back: EvaluationJob = bson::from_document(doc).unwrap();
    assert_eq!(back.status, JobStatus::Completed);
    assert_eq!(back.metadata.student_name, "Asha");
    let report = back.result.unwrap();
    assert_eq!(report.errors.substitutions[0].0, "sat");
}
