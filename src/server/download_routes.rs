//! Media retrieval routes: one-shot bundles and background jobs

use super::error::ApiError;
use super::state::AppState;
use crate::jobs::ProgressEvent;
use crate::storage::{remove_dir_best_effort, DiscardOutcome, ReadyArchive};
use crate::ScraperError;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::future::{self, Future};
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

#[derive(Debug, Deserialize)]
struct MediaRequest {
    #[serde(default)]
    urls: Vec<String>,
    zip_name: Option<String>,
}

impl MediaRequest {
    /// Splits the request, falling back to `default_name` for a blank archive name
    ///
    /// An empty URL list is accepted and yields an empty archive.
    fn into_parts(self, default_name: &str) -> (Vec<String>, String) {
        let zip_name = self
            .zip_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_name.to_string());
        (self.urls, zip_name)
    }
}

/// Removes a scratch directory when dropped
struct ScratchGuard(Option<PathBuf>);

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        let Some(dir) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { remove_dir_best_effort(&dir).await });
            }
            Err(_) => {
                if let Err(e) = std::fs::remove_dir_all(&dir) {
                    tracing::warn!("Failed to remove {}: {}", dir.display(), e);
                }
            }
        }
    }
}

/// An archive body that owns its scratch directory
///
/// The directory goes away with the body, whether the transfer completed
/// or the client disconnected.
struct BundleStream {
    inner: ReaderStream<File>,
    _guard: ScratchGuard,
}

impl Stream for BundleStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Streams `file` and runs `cleanup` only after its last byte was read
fn body_then<F>(file: File, cleanup: F) -> Body
where
    F: Future<Output = ()> + Send + 'static,
{
    let done = stream::once(cleanup).filter_map(|()| future::ready(None::<io::Result<Bytes>>));
    Body::from_stream(ReaderStream::new(file).chain(done))
}

fn archive_response(zip_name: &str, body: Body) -> Response {
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(zip_name)
    );
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

fn progress_event(event: ProgressEvent) -> Event {
    match event {
        ProgressEvent::Snapshot(snapshot) => {
            let json = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string());
            Event::default().data(json)
        }
        ProgressEvent::NotFound => Event::default()
            .event("error")
            .data(json!({ "error": "Job not found" }).to_string()),
    }
}

async fn download_media(
    State(state): State<AppState>,
    Json(request): Json<MediaRequest>,
) -> Result<Response, ApiError> {
    let (urls, zip_name) = request.into_parts(&state.config.jobs.default_zip_name);
    tracing::info!("Bundling {} asset(s) into {}", urls.len(), zip_name);

    let scratch = state.supervisor.download_bundle(&urls).await?;
    let guard = ScratchGuard(Some(scratch.path().to_path_buf()));
    let file = File::open(scratch.archive_path())
        .await
        .map_err(ScraperError::from)?;

    let body = Body::from_stream(BundleStream {
        inner: ReaderStream::new(file),
        _guard: guard,
    });
    Ok(archive_response(&zip_name, body))
}

async fn start_download_media(
    State(state): State<AppState>,
    Json(request): Json<MediaRequest>,
) -> Result<Json<Value>, ApiError> {
    let (urls, zip_name) = request.into_parts(&state.config.jobs.default_zip_name);
    let job_id = state.supervisor.start_job(urls, zip_name);
    Ok(Json(json!({ "job_id": job_id })))
}

async fn download_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = state
        .supervisor
        .progress(job_id)
        .map(|event| Ok::<_, Infallible>(progress_event(event)));

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.config.jobs.keep_alive()))
}

async fn download_ready(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<Value> {
    match state.registry().ready_name(&job_id) {
        Some(zip_name) => Json(json!({ "ready": true, "zip_name": zip_name })),
        None => Json(json!({ "ready": false })),
    }
}

/// Sends a finished archive, then deletes the job and its scratch directory
async fn download_zip(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let not_ready = || ApiError::NotFound("ZIP not ready".to_string());

    let ReadyArchive {
        archive_path,
        zip_name,
        scratch_dir,
    } = state.registry().ready_archive(&job_id).ok_or_else(not_ready)?;
    let file = match File::open(&archive_path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Archive of job {} is unreadable: {}", job_id, e);
            return Err(not_ready());
        }
    };

    let registry = state.registry().clone();
    let cleanup = async move {
        registry.remove(&job_id);
        if let Some(dir) = scratch_dir {
            remove_dir_best_effort(&dir).await;
        }
        tracing::info!("Job {} delivered and removed", job_id);
    };

    Ok(archive_response(&zip_name, body_then(file, cleanup)))
}

/// Drops a finished job without downloading it
async fn discard_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.registry().discard(&job_id) {
        DiscardOutcome::Removed(job) => {
            if let Some(dir) = job.scratch_dir {
                remove_dir_best_effort(&dir).await;
            }
            tracing::info!("Job {} discarded", job_id);
            Ok(Json(json!({ "status": "deleted" })))
        }
        DiscardOutcome::InProgress => Err(ApiError::Conflict("Job still in progress".to_string())),
        DiscardOutcome::NotFound => Err(ApiError::NotFound("Job not found".to_string())),
    }
}

pub fn make_download_routes() -> Router<AppState> {
    Router::new()
        .route("/download-media", post(download_media))
        .route("/start-download-media", post(start_download_media))
        .route("/download-progress/{job_id}", get(download_progress))
        .route("/download-ready/{job_id}", get(download_ready))
        .route("/download-zip/{job_id}", get(download_zip).delete(discard_job))
}
