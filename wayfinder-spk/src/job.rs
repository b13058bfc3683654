//! Speech synthesis job client
//!
//! Drives one synthesis request through `Submitting -> Polling` and on to a
//! terminal state (`Done`, `Failed` or `TimedOut`). Polling is bounded by a
//! deadline measured from submission, so slow polls cannot extend it.

use crate::config::SynthesisConfig;
use crate::error::SynthesisError;
use crate::service::SynthesisService;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Lifecycle of a synthesis job as seen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitting,
    Polling,
    Done,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::TimedOut)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Submitting => "submitting",
            JobState::Polling => "polling",
            JobState::Done => "done",
            JobState::Failed => "failed",
            JobState::TimedOut => "timed-out",
        };
        f.write_str(name)
    }
}

/// Status of the job record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

/// A submitted synthesis request. Only poll responses mutate it.
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub id: String,
    pub status: JobStatus,
    pub result_url: Option<String>,
    pub submitted_at: Instant,
    pub polls: u32,
}

impl SynthesisJob {
    fn submitted(id: String) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            result_url: None,
            submitted_at: Instant::now(),
            polls: 0,
        }
    }
}

/// Terminal result of [`SynthesisJobClient::run`]
#[derive(Debug)]
pub struct JobOutcome {
    pub state: JobState,
    /// `None` when submission itself failed
    pub job: Option<SynthesisJob>,
    pub error: Option<SynthesisError>,
}

impl JobOutcome {
    fn done(job: SynthesisJob) -> Self {
        Self {
            state: JobState::Done,
            job: Some(job),
            error: None,
        }
    }

    fn failed(mut job: Option<SynthesisJob>, error: SynthesisError) -> Self {
        if let Some(ref mut job) = job {
            job.status = JobStatus::Failed;
        }
        Self {
            state: JobState::Failed,
            job,
            error: Some(error),
        }
    }

    fn timed_out(mut job: SynthesisJob) -> Self {
        job.status = JobStatus::Failed;
        let error = SynthesisError::TimedOut {
            request_id: job.id.clone(),
            elapsed: job.submitted_at.elapsed(),
        };
        Self {
            state: JobState::TimedOut,
            job: Some(job),
            error: Some(error),
        }
    }

    /// Result URL on `Done`, the recorded error otherwise
    pub fn into_result(self) -> Result<String, SynthesisError> {
        match (self.state, self.job, self.error) {
            (JobState::Done, Some(SynthesisJob { result_url: Some(url), .. }), _) => Ok(url),
            (_, _, Some(error)) => Err(error),
            (state, job, None) => Err(SynthesisError::InvalidResponse(format!(
                "job {} ended in state {} without a result",
                job.map(|j| j.id).unwrap_or_default(),
                state
            ))),
        }
    }
}

/// Submits text and polls the provider until the audio URL is ready
#[derive(Clone)]
pub struct SynthesisJobClient {
    service: Arc<dyn SynthesisService>,
    poll_interval: Duration,
    timeout: Duration,
}

impl SynthesisJobClient {
    pub fn new(service: Arc<dyn SynthesisService>, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            service,
            poll_interval,
            timeout,
        }
    }

    pub fn from_config(service: Arc<dyn SynthesisService>, config: &SynthesisConfig) -> Self {
        Self::new(service, config.poll_interval(), config.timeout())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Synthesize `text`, returning the audio URL
    pub async fn synthesize(&self, text: &str) -> Result<String, SynthesisError> {
        self.run(text).await.into_result()
    }

    /// Run one job to a terminal state
    pub async fn run(&self, text: &str) -> JobOutcome {
        debug!("Synthesis job: {}", JobState::Submitting);

        let request_id = match self.service.submit(text).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to start synthesis: {}", e);
                return JobOutcome::failed(None, e);
            }
        };

        let mut job = SynthesisJob::submitted(request_id);
        let deadline = job.submitted_at + self.timeout;
        info!("Synthesis job {} submitted, {}", job.id, JobState::Polling);

        loop {
            if Instant::now() >= deadline {
                warn!("Polling for synthesis job {} timed out after {:?}", job.id, self.timeout);
                return JobOutcome::timed_out(job);
            }

            job.polls += 1;
            let report = match time::timeout_at(deadline, self.service.status(&job.id)).await {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => {
                    warn!("Status poll {} for job {} failed: {}", job.polls, job.id, e);
                    return JobOutcome::failed(Some(job), e);
                }
                Err(_) => {
                    warn!("Status poll {} for job {} outlived the job deadline", job.polls, job.id);
                    return JobOutcome::timed_out(job);
                }
            };

            if report.is_done() {
                return match report.result_url {
                    Some(url) => {
                        info!("Synthesis job {} done after {} polls: {}", job.id, job.polls, url);
                        job.status = JobStatus::Done;
                        job.result_url = Some(url);
                        JobOutcome::done(job)
                    }
                    None => {
                        warn!("Synthesis job {} is done, but result_url is missing", job.id);
                        let error = SynthesisError::MissingResultUrl(job.id.clone());
                        JobOutcome::failed(Some(job), error)
                    }
                };
            }

            debug!("Synthesis job {} status: {}", job.id, report.status);
            let next_poll = (Instant::now() + self.poll_interval).min(deadline);
            time::sleep_until(next_poll).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{JobStatusReport, MockSynthesisService};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn pending() -> JobStatusReport {
        JobStatusReport {
            status: "pending".to_string(),
            result_url: None,
        }
    }

    fn client(mock: MockSynthesisService) -> SynthesisJobClient {
        SynthesisJobClient::new(Arc::new(mock), Duration::from_secs(2), Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_done() {
        let mut mock = MockSynthesisService::new();
        mock.expect_submit()
            .withf(|text| text == "Path is clear.")
            .times(1)
            .returning(|_| Ok("r1".to_string()));

        let polls = AtomicU32::new(0);
        mock.expect_status()
            .withf(|id| id == "r1")
            .times(2)
            .returning(move |_| {
                if polls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(pending())
                } else {
                    Ok(JobStatusReport {
                        status: "done".to_string(),
                        result_url: Some("https://x/a.mp3".to_string()),
                    })
                }
            });

        let start = Instant::now();
        let outcome = client(mock).run("Path is clear.").await;

        assert_eq!(outcome.state, JobState::Done);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        let job = outcome.job.as_ref().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.polls, 2);
        assert_eq!(tokio_test::assert_ok!(outcome.into_result()), "https://x/a.mp3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure_never_polls() {
        let mut mock = MockSynthesisService::new();
        mock.expect_submit().times(1).returning(|_| {
            Err(SynthesisError::Status {
                status: 500,
                body: "internal".to_string(),
            })
        });
        mock.expect_status().times(0);

        let outcome = client(mock).run("hello").await;
        assert_eq!(outcome.state, JobState::Failed);
        assert!(outcome.job.is_none());
        assert!(matches!(
            outcome.into_result(),
            Err(SynthesisError::Status { status: 500, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_without_url_fails() {
        let mut mock = MockSynthesisService::new();
        mock.expect_submit().returning(|_| Ok("r2".to_string()));
        mock.expect_status().times(1).returning(|_| {
            Ok(JobStatusReport {
                status: "done".to_string(),
                result_url: None,
            })
        });

        let outcome = client(mock).run("hello").await;
        assert_eq!(outcome.state, JobState::Failed);
        assert_eq!(outcome.job.as_ref().unwrap().status, JobStatus::Failed);
        assert!(matches!(
            outcome.into_result(),
            Err(SynthesisError::MissingResultUrl(id)) if id == "r2"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_fails_immediately() {
        let mut mock = MockSynthesisService::new();
        mock.expect_submit().returning(|_| Ok("r3".to_string()));
        mock.expect_status().times(1).returning(|_| {
            Err(SynthesisError::Status {
                status: 404,
                body: "unknown request".to_string(),
            })
        });

        let start = Instant::now();
        let outcome = client(mock).run("hello").await;
        assert_eq!(outcome.state, JobState::Failed);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(outcome.job.unwrap().polls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_thirty_seconds_after_submission() {
        let mut mock = MockSynthesisService::new();
        mock.expect_submit().returning(|_| Ok("r4".to_string()));
        mock.expect_status().returning(|_| Ok(pending()));

        let start = Instant::now();
        let outcome = client(mock).run("hello").await;

        assert_eq!(outcome.state, JobState::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        // Polls at 0, 2, ..., 28 seconds
        assert_eq!(outcome.job.as_ref().unwrap().polls, 15);
        assert!(matches!(
            outcome.into_result(),
            Err(SynthesisError::TimedOut { request_id, .. }) if request_id == "r4"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_statuses_keep_polling() {
        let mut mock = MockSynthesisService::new();
        mock.expect_submit().returning(|_| Ok("r5".to_string()));
        let polls = AtomicU32::new(0);
        mock.expect_status().returning(move |_| {
            let n = polls.fetch_add(1, Ordering::SeqCst);
            let status = match n {
                0 => "queued",
                1 => "processing",
                2 => "failed",
                _ => "done",
            };
            Ok(JobStatusReport {
                status: status.to_string(),
                result_url: Some("https://x/b.mp3".to_string()),
            })
        });

        let outcome = client(mock).run("hello").await;
        assert_eq!(outcome.state, JobState::Done);
        assert_eq!(outcome.job.unwrap().polls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_poll_cannot_extend_deadline() {
        struct SlowService;

        #[async_trait::async_trait]
        impl SynthesisService for SlowService {
            async fn submit(&self, _text: &str) -> Result<String, SynthesisError> {
                Ok("r6".to_string())
            }

            async fn status(&self, _request_id: &str) -> Result<JobStatusReport, SynthesisError> {
                time::sleep(Duration::from_secs(12)).await;
                Ok(pending())
            }
        }

        let client = SynthesisJobClient::new(Arc::new(SlowService), Duration::from_secs(2), Duration::from_secs(30));
        let start = Instant::now();
        let outcome = client.run("hello").await;

        assert_eq!(outcome.state, JobState::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Submitting.is_terminal());
        assert!(!JobState::Polling.is_terminal());
        assert!(JobState::Done.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::TimedOut.is_terminal());
    }
}
