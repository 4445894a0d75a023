//! HTTP-surface tests: submission validation and status lookup, driven
//! through the router with no database behind it.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use lectio_api::build_router;
use tower::util::ServiceExt;

use crate::support::lazy_state;

const BOUNDARY: &str = "lectio-test-boundary";

fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(fname) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{fname}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn submit_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/evaluation")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn wav_header_bytes() -> Vec<u8> {
    // Just enough RIFF/WAVE magic for the container sniff; the decode
    // happens later, in the worker.
    let mut bytes = b"RIFF".to_vec();
    bytes.extend_from_slice(&36u32.to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&[0u8; 24]);
    bytes
}

#[tokio::test]
async fn health_endpoint_answers() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(lazy_state(dir.path().to_path_buf()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn submit_rejects_empty_reference_text() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(lazy_state(dir.path().to_path_buf()));

    let wav = wav_header_bytes();
    let request = submit_request(&[
        ("audio", Some("reading.wav"), &wav),
        ("reference_text", None, b"   "),
    ]);

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn submit_rejects_missing_audio() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(lazy_state(dir.path().to_path_buf()));

    let request = submit_request(&[("reference_text", None, b"The cat sat on the mat" as &[u8])]);

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_rejects_unrecognized_audio_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(lazy_state(dir.path().to_path_buf()));

    let garbage = vec![0x00u8; 64];
    let request = submit_request(&[
        ("audio", Some("reading.xyz"), garbage.as_slice()),
        ("reference_text", None, b"The cat sat on the mat"),
    ]);

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_of_malformed_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(lazy_state(dir.path().to_path_buf()));

    let response = app
        .oneshot(
            Request::get("/api/evaluation/not-a-task-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
