//! Progress streamer - polls one job and yields snapshots as they change

use crate::state::{JobSnapshot, JobStatus};
use crate::storage::JobRegistry;
use chrono::Utc;
use futures::stream::{self, Stream};
use std::time::Duration;

/// One item of a job's progress stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Snapshot(JobSnapshot),
    /// The job is unknown; always the last item
    NotFound,
}

struct PollState {
    registry: JobRegistry,
    job_id: String,
    interval: Duration,
    polled: bool,
    last_status: Option<JobStatus>,
    finished: bool,
}

/// Streams the progress of `job_id`, polling every `poll_interval`
///
/// Every poll counts as an observation of the job and refreshes its
/// last-activity stamp. A snapshot is yielded whenever the status differs
/// from the previous one, and always once the job is ready. The stream
/// ends after the first ready or errored snapshot, or right after
/// `NotFound` when the job is absent.
pub fn progress_stream(
    registry: JobRegistry,
    job_id: String,
    poll_interval: Duration,
) -> impl Stream<Item = ProgressEvent> + Send + 'static {
    let state = PollState {
        registry,
        job_id,
        interval: poll_interval,
        polled: false,
        last_status: None,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            if state.polled {
                tokio::time::sleep(state.interval).await;
            }
            state.polled = true;

            let Some(snapshot) = state.registry.observe(&state.job_id, Utc::now()) else {
                state.finished = true;
                return Some((ProgressEvent::NotFound, state));
            };

            let changed = state.last_status != Some(snapshot.status);
            if changed || snapshot.ready {
                state.last_status = Some(snapshot.status);
                state.finished = snapshot.is_final();
                return Some((ProgressEvent::Snapshot(snapshot), state));
            }
        }
    })
}
