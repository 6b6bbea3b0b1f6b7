//! Background ingestion jobs: document upload, status polling and
//! cancellation.

use crate::error::BackendError;
use crate::http::JsonClient;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use graphdesk_events::{Event, EventBus};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use graphdesk_events::JobState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub task_id: String,
    pub status: JobState,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
}

#[async_trait]
pub trait JobService: Send + Sync {
    /// Uploads a document for ingestion into `db_name`; returns the job id.
    async fn submit(&self, filename: &str, bytes: &[u8], db_name: &str) -> Result<String, BackendError>;

    async fn status(&self, job_id: &str) -> Result<JobStatus, BackendError>;

    async fn cancel(&self, job_id: &str) -> Result<(), BackendError>;
}

#[derive(Serialize)]
struct CancelBody<'a> {
    task_id: &'a str,
}

#[derive(Serialize)]
struct UploadBody<'a> {
    /// Data URL carrying the document bytes.
    file_base64: String,
    filename: &'a str,
    db_name: &'a str,
}

#[derive(Deserialize)]
struct UploadReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn data_url(bytes: &[u8]) -> String {
    format!("data:application/octet-stream;base64,{}", STANDARD.encode(bytes))
}

pub struct HttpJobService {
    http: JsonClient,
}

impl HttpJobService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        Ok(Self {
            http: JsonClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl JobService for HttpJobService {
    async fn submit(&self, filename: &str, bytes: &[u8], db_name: &str) -> Result<String, BackendError> {
        let body = UploadBody {
            file_base64: data_url(bytes),
            filename,
            db_name,
        };
        let reply: UploadReply = self.http.post("/upload_doc", &body).await?;
        match reply.task_id.filter(|id| reply.ok && !id.is_empty()) {
            Some(task_id) => Ok(task_id),
            None => Err(BackendError::invalid_reply(
                "/upload_doc",
                reply.error.unwrap_or_else(|| "no task id".to_string()),
            )),
        }
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus, BackendError> {
        self.http.get("/task_status", &[("task_id", job_id)]).await
    }

    async fn cancel(&self, job_id: &str) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .http
            .post("/cancel_task", &CancelBody { task_id: job_id })
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedJob {
    pub id: String,
    /// Local id tying log lines for one tracked job together.
    pub correlation: Uuid,
    /// What the job is ingesting, usually a file name.
    pub label: String,
    pub state: JobState,
    pub message: Option<String>,
    pub progress: Option<f64>,
}

/// Polls every tracked job on a fixed interval until all of them are terminal.
pub struct JobMonitor {
    service: Arc<dyn JobService>,
    jobs: Mutex<Vec<TrackedJob>>,
    bus: EventBus,
    poll_interval: Duration,
}

impl JobMonitor {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(service: Arc<dyn JobService>, bus: EventBus, poll_interval: Duration) -> Self {
        Self {
            service,
            jobs: Mutex::new(Vec::new()),
            bus,
            poll_interval,
        }
    }

    pub fn track(&self, id: impl Into<String>, label: impl Into<String>) {
        let job = TrackedJob {
            id: id.into(),
            correlation: Uuid::new_v4(),
            label: label.into(),
            state: JobState::Queued,
            message: None,
            progress: None,
        };
        let mut jobs = self.jobs.lock();
        if jobs.iter().all(|j| j.id != job.id) {
            jobs.push(job);
        }
    }

    /// Uploads a document and starts tracking the job it spawned, labelled
    /// with the file name.
    pub async fn submit(&self, filename: &str, bytes: &[u8], db_name: &str) -> Result<String, BackendError> {
        let id = self.service.submit(filename, bytes, db_name).await?;
        info!("Submitted {} ({} bytes) as job {}", filename, bytes.len(), id);
        self.track(id.clone(), filename);
        Ok(id)
    }

    /// Forgets a job; returns whether it was tracked.
    pub fn clear(&self, id: &str) -> bool {
        let mut jobs = self.jobs.lock();
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        jobs.len() != before
    }

    pub fn jobs(&self) -> Vec<TrackedJob> {
        self.jobs.lock().clone()
    }

    pub fn all_settled(&self) -> bool {
        self.jobs.lock().iter().all(|j| j.state.is_terminal())
    }

    /// Requests cancellation and marks the job as cancelling without waiting
    /// for the next poll.
    pub async fn cancel(&self, id: &str) -> Result<(), BackendError> {
        self.service.cancel(id).await?;
        self.apply(JobStatus {
            task_id: id.to_string(),
            status: JobState::Cancelling,
            message: None,
            progress: None,
        });
        Ok(())
    }

    fn apply(&self, status: JobStatus) {
        let changed = {
            let mut jobs = self.jobs.lock();
            let Some(job) = jobs.iter_mut().find(|j| j.id == status.task_id) else {
                return;
            };
            let changed = job.state != status.status || job.message != status.message;
            job.state = status.status;
            if status.message.is_some() {
                job.message = status.message.clone();
            }
            if status.progress.is_some() {
                job.progress = status.progress;
            }
            changed
        };
        if changed {
            self.bus.publish(Event::JobUpdated {
                job_id: status.task_id,
                state: status.status,
                message: status.message,
            });
        }
    }

    /// One polling round over the non-terminal jobs. Returns true once every
    /// tracked job is terminal.
    pub async fn poll_once(&self) -> bool {
        let pending: Vec<(String, Uuid)> = self
            .jobs
            .lock()
            .iter()
            .filter(|j| !j.state.is_terminal())
            .map(|j| (j.id.clone(), j.correlation))
            .collect();

        for (id, correlation) in pending {
            match self.service.status(&id).await {
                Ok(status) => self.apply(status),
                Err(e) => warn!("Failed to poll job {} ({}): {}", id, correlation, e),
            }
        }
        self.all_settled()
    }

    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if self.poll_once().await {
                break;
            }
        }

        let jobs = self.jobs();
        let count = |state: JobState| jobs.iter().filter(|j| j.state == state).count();
        debug!("All {} jobs settled", jobs.len());
        self.bus.publish(Event::JobsSettled {
            completed: count(JobState::Completed),
            failed: count(JobState::Failed),
            cancelled: count(JobState::Cancelled),
        });
    }

    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move { monitor.run().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Replays a fixed sequence of states per job; the last one repeats.
    #[derive(Default)]
    struct ScriptedJobs {
        script: Mutex<HashMap<String, VecDeque<JobState>>>,
        cancelled: Mutex<Vec<String>>,
        submitted: Mutex<Vec<String>>,
    }

    impl ScriptedJobs {
        fn with(self, id: &str, states: &[JobState]) -> Self {
            self.script
                .lock()
                .insert(id.to_string(), states.iter().copied().collect());
            self
        }
    }

    #[async_trait]
    impl JobService for ScriptedJobs {
        async fn submit(&self, filename: &str, _bytes: &[u8], _db_name: &str) -> Result<String, BackendError> {
            let mut submitted = self.submitted.lock();
            submitted.push(filename.to_string());
            Ok(format!("job-{}", submitted.len()))
        }

        async fn status(&self, job_id: &str) -> Result<JobStatus, BackendError> {
            let mut script = self.script.lock();
            let queue = script.entry(job_id.to_string()).or_default();
            let state = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().copied()
            }
            .unwrap_or(JobState::Failed);
            Ok(JobStatus {
                task_id: job_id.to_string(),
                status: state,
                message: None,
                progress: None,
            })
        }

        async fn cancel(&self, job_id: &str) -> Result<(), BackendError> {
            self.cancelled.lock().push(job_id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_monitor_runs_until_terminal() {
        let service = ScriptedJobs::default()
            .with("a", &[JobState::Running, JobState::Completed])
            .with("b", &[JobState::Running, JobState::Running, JobState::Failed]);
        let bus = EventBus::new();
        let monitor = Arc::new(JobMonitor::new(Arc::new(service), bus.clone(), Duration::from_millis(5)));
        monitor.track("a", "notes.txt");
        monitor.track("b", "syllabus.pdf");

        monitor.spawn().await.unwrap();

        assert!(monitor.all_settled());
        let events = bus.drain();
        assert!(matches!(
            events.last(),
            Some(Event::JobsSettled {
                completed: 1,
                failed: 1,
                cancelled: 0
            })
        ));
        let updates = events
            .iter()
            .filter(|e| matches!(e, Event::JobUpdated { .. }))
            .count();
        assert_eq!(updates, 4);
    }

    #[tokio::test]
    async fn test_cancel_is_optimistic() {
        let service = Arc::new(ScriptedJobs::default().with("a", &[JobState::Cancelled]));
        let monitor = JobMonitor::new(service.clone(), EventBus::new(), Duration::from_millis(5));
        monitor.track("a", "big.pdf");

        monitor.cancel("a").await.unwrap();
        assert_eq!(monitor.jobs()[0].state, JobState::Cancelling);
        assert_eq!(service.cancelled.lock().as_slice(), ["a".to_string()]);

        assert!(monitor.poll_once().await);
        assert_eq!(monitor.jobs()[0].state, JobState::Cancelled);
        assert!(monitor.clear("a"));
        assert!(monitor.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_submit_tracks_new_job() {
        let service = Arc::new(ScriptedJobs::default().with("job-1", &[JobState::Completed]));
        let monitor = JobMonitor::new(service.clone(), EventBus::new(), Duration::from_millis(5));

        let id = monitor.submit("fractions.pdf", b"%PDF", "neo4j").await.unwrap();
        assert_eq!(id, "job-1");
        let jobs = monitor.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].label, "fractions.pdf");
        assert_eq!(jobs[0].state, JobState::Queued);

        assert!(monitor.poll_once().await);
        assert_eq!(monitor.jobs()[0].state, JobState::Completed);
    }

    #[tokio::test]
    async fn test_http_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload_doc"))
            .and(body_json(json!({
                "file_base64": "data:application/octet-stream;base64,aGVsbG8=",
                "filename": "notes.txt",
                "db_name": "neo4j"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "task_id": "t-9"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload_doc"))
            .and(body_json(json!({
                "file_base64": "data:application/octet-stream;base64,",
                "filename": "empty.txt",
                "db_name": "neo4j"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "empty file"})))
            .mount(&server)
            .await;

        let service = HttpJobService::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(service.submit("notes.txt", b"hello", "neo4j").await.unwrap(), "t-9");
        let err = service.submit("empty.txt", b"", "neo4j").await.unwrap_err();
        assert!(matches!(&err, BackendError::InvalidReply { reason, .. } if reason == "empty file"));
    }

    #[tokio::test]
    async fn test_http_job_service() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/task_status"))
            .and(query_param("task_id", "t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": "t-1", "status": "running", "message": "Indexing", "progress": 0.5, "created_at": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cancel_task"))
            .and(body_json(json!({"task_id": "t-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let service = HttpJobService::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let status = service.status("t-1").await.unwrap();
        assert_eq!(status.status, JobState::Running);
        assert_eq!(status.progress, Some(0.5));
        service.cancel("t-1").await.unwrap();
    }
}
