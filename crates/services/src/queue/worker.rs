use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use lectio_evaluation::evaluator::canonical_wav_path;
use lectio_evaluation::ReadingEvaluator;

use crate::dao::EvaluationJobDao;
use crate::queue::ConnectivityProbe;

/// The single background worker that drains the evaluation queue.
///
/// One instance runs for the lifetime of the process. Every polling cycle it
/// probes connectivity, claims at most the one oldest queued job, and runs
/// the full pipeline on it before sleeping again — strictly one job in
/// flight, strict FIFO by submission sequence. Pipeline errors are contained
/// here: the offending job is marked failed and the loop keeps polling.
pub struct QueueWorker {
    jobs: Arc<EvaluationJobDao>,
    evaluator: Arc<ReadingEvaluator>,
    probe: ConnectivityProbe,
    poll_interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
}

impl QueueWorker {
    pub fn new(
        jobs: Arc<EvaluationJobDao>,
        evaluator: Arc<ReadingEvaluator>,
        probe: ConnectivityProbe,
        poll_interval: Duration,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            jobs,
            evaluator,
            probe,
            poll_interval,
            shutdown_rx,
        }
    }

    /// Runs until a shutdown signal arrives. Shutdown interrupts the sleep
    /// between cycles, never a job mid-flight.
    pub async fn run(self) {
        let QueueWorker {
            jobs,
            evaluator,
            probe,
            poll_interval,
            mut shutdown_rx,
        } = self;

        info!(
            poll_interval_secs = poll_interval.as_secs(),
            "Evaluation queue worker started"
        );

        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Evaluation queue worker shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if !probe.is_online().await {
                        // Offline: skip the cycle entirely, touch no job.
                        debug!("Network unreachable, skipping queue cycle");
                        continue;
                    }
                    Self::process_next(&jobs, &evaluator).await;
                }
            }
        }
    }

    /// Claims and processes the oldest queued job, if any.
    async fn process_next(jobs: &EvaluationJobDao, evaluator: &ReadingEvaluator) {
        let job = match jobs.claim_next().await {
            Ok(Some(job)) => job,
            Ok(None) => return,
            Err(e) => {
                error!(error = %e, "Failed to claim next job");
                return;
            }
        };

        let Some(job_id) = job.id else {
            error!(seq = job.seq, "Claimed job has no id, skipping");
            return;
        };

        info!(%job_id, seq = job.seq, "Processing evaluation job");
        let audio_path = PathBuf::from(&job.audio_path);

        match evaluator.evaluate(&audio_path, &job.reference_text).await {
            Ok(report) => {
                if let Err(e) = jobs.complete(job_id, &report).await {
                    error!(%job_id, error = %e, "Failed to persist completed report");
                } else {
                    info!(
                        %job_id,
                        wer = report.accuracy.word_error_rate,
                        grade = %report.overall_grade.accuracy_grade,
                        "Evaluation job completed"
                    );
                }
            }
            Err(e) => {
                // Detail stays in the logs; pollers only see "Processing failed".
                warn!(%job_id, error = %e, "Evaluation job failed");
                if let Err(e) = jobs.fail(job_id).await {
                    error!(%job_id, error = %e, "Failed to mark job failed");
                }
            }
        }

        // Source audio is removed after any terminal state.
        cleanup_audio(&audio_path).await;
    }
}

/// Deletes the uploaded blob and its canonical WAV once the job is terminal.
async fn cleanup_audio(audio_path: &Path) {
    let canonical = canonical_wav_path(audio_path);
    let mut targets = vec![audio_path.to_path_buf()];
    if canonical != audio_path {
        targets.push(canonical);
    }

    for path in targets {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Removed processed audio file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove audio file"),
        }
    }
}
