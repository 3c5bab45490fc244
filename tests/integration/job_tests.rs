//! Integration tests for retrieval jobs through the HTTP router

use audiobreak_scraper::config::Config;
use audiobreak_scraper::jobs::StaleJobSweeper;
use audiobreak_scraper::server::{build_router, AppState};
use audiobreak_scraper::JobStatus;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{TimeDelta, Utc};
use serde_json::{json, Value};
use std::io::Cursor;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_state(scratch: &TempDir) -> AppState {
    let mut config = Config::default();
    config.jobs.scratch_dir = Some(scratch.path().to_path_buf());
    config.jobs.poll_interval_ms = 50;
    config.fetch.asset_timeout_secs = 5;
    AppState::new(config).expect("Failed to build state")
}

async fn mount_assets(server: &MockServer) {
    for (route, body) in [("/a.mp3", "aaa"), ("/b.mp3", "bbbb"), ("/cover.png", "png")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/missing.mp3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.mp3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

fn asset_urls(server: &MockServer) -> Vec<String> {
    ["/a.mp3", "/missing.mp3", "/b.mp3", "/broken.mp3", "/cover.png?w=300"]
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let (_, _, body) = get(app, uri).await;
    serde_json::from_slice(&body).unwrap()
}

async fn start_job(app: &Router, body: Value) -> String {
    let (status, _, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/start-download-media")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_slice(&body).unwrap();
    value["job_id"].as_str().unwrap().to_string()
}

async fn wait_until_ready(app: &Router, job_id: &str) -> Value {
    for _ in 0..100 {
        let value = get_json(app, &format!("/download-ready/{}", job_id)).await;
        if value["ready"] == json!(true) {
            return value;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {} never became ready", job_id);
}

#[tokio::test]
async fn test_job_with_failed_assets_archives_the_rest() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let scratch = TempDir::new().unwrap();
    let state = test_state(&scratch);
    let app = build_router(state.clone());

    let job_id = start_job(
        &app,
        json!({ "urls": asset_urls(&server), "zip_name": "session tracks.zip" }),
    )
    .await;

    let ready = wait_until_ready(&app, &job_id).await;
    assert_eq!(ready["zip_name"], "session tracks.zip");

    let snapshot = state.registry().snapshot(&job_id).unwrap();
    assert_eq!(snapshot.status, JobStatus::Ready);
    assert_eq!(snapshot.current, 5);
    assert_eq!(snapshot.total, 5);

    let (status, headers, body) = get(&app, &format!("/download-zip/{}", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename*=UTF-8''session%20tracks.zip"
    );
    assert_eq!(body.len() as u64, snapshot.zip_size);

    let mut archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["a.mp3", "b.mp3", "cover.png"]);

    let mut content = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("b.mp3").unwrap(), &mut content).unwrap();
    assert_eq!(content, "bbbb");

    // The archive can only be fetched once
    let (status, _, _) = get(&app, &format!("/download-zip/{}", job_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!state.registry().contains(&job_id));
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_progress_stream_of_finished_job() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let scratch = TempDir::new().unwrap();
    let app = build_router(test_state(&scratch));

    let job_id = start_job(&app, json!({ "urls": asset_urls(&server) })).await;
    wait_until_ready(&app, &job_id).await;

    let (status, headers, body) = get(&app, &format!("/download-progress/{}", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let text = String::from_utf8(body).unwrap();
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .unwrap()
        .trim();
    let snapshot: Value = serde_json::from_str(data).unwrap();
    assert_eq!(snapshot["status"], "ready");
    assert_eq!(snapshot["ready"], true);
    assert_eq!(snapshot["current"], 5);
    assert_eq!(snapshot["zip_name"], "media-assets.zip");
}

#[tokio::test]
async fn test_progress_stream_of_unknown_job() {
    let scratch = TempDir::new().unwrap();
    let app = build_router(test_state(&scratch));

    let (status, _, body) = get(&app, "/download-progress/does-not-exist").await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    let event = text
        .lines()
        .find_map(|line| line.strip_prefix("event:"))
        .unwrap();
    assert_eq!(event.trim(), "error");
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .unwrap();
    let value: Value = serde_json::from_str(data.trim()).unwrap();
    assert_eq!(value, json!({ "error": "Job not found" }));
}

#[tokio::test]
async fn test_swept_job_is_no_longer_ready() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let scratch = TempDir::new().unwrap();
    let state = test_state(&scratch);
    let app = build_router(state.clone());

    let job_id = start_job(&app, json!({ "urls": asset_urls(&server) })).await;
    wait_until_ready(&app, &job_id).await;

    let sweeper = StaleJobSweeper::new(
        state.registry().clone(),
        Duration::from_secs(3600),
        Duration::from_secs(7200),
    );
    let later = Utc::now() + TimeDelta::hours(3);
    assert_eq!(sweeper.sweep(later).await, 1);

    let value = get_json(&app, &format!("/download-ready/{}", job_id)).await;
    assert_eq!(value, json!({ "ready": false }));
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_discard_finished_job() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let scratch = TempDir::new().unwrap();
    let app = build_router(test_state(&scratch));

    let job_id = start_job(&app, json!({ "urls": asset_urls(&server) })).await;
    wait_until_ready(&app, &job_id).await;

    let delete = |id: &str| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/download-zip/{}", id))
            .body(Body::empty())
            .unwrap()
    };

    let (status, _, body) = send(&app, delete(&job_id)).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value, json!({ "status": "deleted" }));

    let (status, _, _) = send(&app, delete(&job_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_media_streams_bundle() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let scratch = TempDir::new().unwrap();
    let app = build_router(test_state(&scratch));

    let (status, headers, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/download-media")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "urls": asset_urls(&server) }).to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename*=UTF-8''media-assets.zip"
    );
    let archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    assert_eq!(archive.len(), 3);
}

#[tokio::test]
async fn test_empty_url_list_yields_empty_archive() {
    let scratch = TempDir::new().unwrap();
    let state = test_state(&scratch);
    let app = build_router(state.clone());

    let job_id = start_job(&app, json!({ "urls": [] })).await;
    wait_until_ready(&app, &job_id).await;

    let snapshot = state.registry().snapshot(&job_id).unwrap();
    assert_eq!(snapshot.status, JobStatus::Ready);
    assert_eq!(snapshot.current, 0);
    assert_eq!(snapshot.total, 0);

    let (status, _, body) = get(&app, &format!("/download-zip/{}", job_id)).await;
    assert_eq!(status, StatusCode::OK);
    let archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    assert_eq!(archive.len(), 0);

    let (status, _, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/download-media")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "urls": [] }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    assert_eq!(archive.len(), 0);
}
