use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bson::oid::ObjectId;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use lectio_db::models::{AssessmentMetadata, JobStatus};
use lectio_evaluation::audio::sniff_container;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Default, Validate)]
struct SubmissionFields {
    #[validate(length(min = 1, message = "reference_text must not be empty"))]
    reference_text: String,
    student_name: String,
    grade_level: String,
    text_title: String,
    audio_duration: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub task_id: String,
}

/// `POST /api/evaluation` — multipart submission of one reading.
///
/// Validation failures (missing audio, empty reference text, bytes no
/// decoder recognizes) are rejected here, before anything enters the queue;
/// everything after this point is only observable via status polling.
pub async fn submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let mut audio_bytes: Option<Vec<u8>> = None;
    let mut audio_filename: Option<String> = None;
    let mut fields = SubmissionFields {
        student_name: "Unknown Student".to_string(),
        grade_level: "1".to_string(),
        text_title: "Reading Assessment".to_string(),
        ..Default::default()
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                audio_filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {e}")))?;
                audio_bytes = Some(bytes.to_vec());
            }
            Some("reference_text") => {
                fields.reference_text = read_text(field).await?.trim().to_string();
            }
            Some("student_name") => fields.student_name = read_text(field).await?,
            Some("grade_level") => fields.grade_level = read_text(field).await?,
            Some("text_title") => fields.text_title = read_text(field).await?,
            Some("audio_duration") => {
                fields.audio_duration = read_text(field).await?.parse().ok();
            }
            _ => {}
        }
    }

    fields.validate()?;

    let audio = audio_bytes
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))?;

    let extension = audio_filename
        .as_deref()
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_string()));
    let format = sniff_container(&audio, extension.as_deref()).ok_or_else(|| {
        warn!(?audio_filename, "Rejected upload in unrecognized audio format");
        ApiError::BadRequest("Unreadable or unsupported audio format".to_string())
    })?;

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("cannot create upload dir: {e}")))?;
    let audio_path = state
        .upload_dir
        .join(format!("{}.{format}", uuid::Uuid::new_v4()));
    tokio::fs::write(&audio_path, &audio)
        .await
        .map_err(|e| ApiError::Internal(format!("cannot store audio: {e}")))?;

    let metadata = AssessmentMetadata {
        student_name: fields.student_name,
        grade_level: fields.grade_level,
        text_title: fields.text_title,
        audio_duration_seconds: fields.audio_duration,
    };

    let job = state
        .jobs
        .enqueue(
            audio_path.to_string_lossy().into_owned(),
            fields.reference_text,
            metadata,
        )
        .await?;

    let task_id = job
        .id
        .map(|id| id.to_hex())
        .ok_or_else(|| ApiError::Internal("job stored without id".to_string()))?;

    info!(%task_id, seq = job.seq, bytes = audio.len(), format, "Evaluation job queued");

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { task_id })))
}

/// `GET /api/evaluation/{task_id}` — poll a job.
///
/// Completed jobs answer with the full report; failed jobs surface only a
/// generic error (detail stays in the server logs); anything else reports
/// its queue state.
pub async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = ObjectId::parse_str(&task_id)
        .map_err(|_| ApiError::NotFound("Task not found".to_string()))?;

    let job = state.jobs.find_by_id(id).await.map_err(|e| match e {
        lectio_services::dao::base::DaoError::NotFound => {
            ApiError::NotFound("Task not found".to_string())
        }
        other => other.into(),
    })?;

    Ok(match job.status {
        JobStatus::Completed => match job.result {
            Some(report) => Json(report).into_response(),
            None => {
                ApiError::Internal("completed job is missing its report".to_string())
                    .into_response()
            }
        },
        JobStatus::Failed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Processing failed" })),
        )
            .into_response(),
        queued_or_processing => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "status": queued_or_processing.as_str() })),
        )
            .into_response(),
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid form field: {e}")))
}
