use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

use crate::driver::SessionFactory;
use crate::error::ScrapeError;
use crate::models::credentials::UserCredentials;
use crate::models::schedule::{FilterSelection, ScrapeResult};
use crate::services::scraper::{run_scrape, ScrapePolicy};

/// Lifecycle of one scrape job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failure,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failure => "FAILURE",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }
}

/// Snapshot of a job's state as seen by a poller. Terminal states carry
/// either the immutable result or a structured error message, never a raw
/// fault.
#[derive(Debug, Clone)]
pub struct JobState {
    pub status: JobStatus,
    pub result: Option<ScrapeResult>,
    pub error: Option<String>,
}

impl JobState {
    fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            result: None,
            error: None,
        }
    }
}

/// Shared in-process job state map, constructed once by the dispatcher and
/// read by the polling paths.
pub struct JobStore {
    jobs: Mutex<HashMap<Uuid, JobState>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn insert_pending(&self, id: Uuid) {
        self.jobs.lock().unwrap().insert(id, JobState::pending());
    }

    fn set_running(&self, id: Uuid) {
        if let Some(state) = self.jobs.lock().unwrap().get_mut(&id) {
            state.status = JobStatus::Running;
        }
    }

    fn complete(&self, id: Uuid, outcome: Result<ScrapeResult, ScrapeError>) {
        let mut jobs = self.jobs.lock().unwrap();
        let state = match outcome {
            Ok(result) => JobState {
                status: JobStatus::Success,
                result: Some(result),
                error: None,
            },
            Err(e) => JobState {
                status: JobStatus::Failure,
                result: None,
                error: Some(e.to_string()),
            },
        };
        jobs.insert(id, state);
    }

    pub fn get(&self, id: &Uuid) -> Option<JobState> {
        self.jobs.lock().unwrap().get(id).cloned()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one job needs, captured at dispatch time.
pub struct ScrapeJob {
    pub selection: FilterSelection,
    pub credentials: UserCredentials,
    pub policy: ScrapePolicy,
}

/// Fire-and-return-handle task dispatcher.
///
/// `dispatch` records a pending job and spawns it onto the runtime,
/// returning the opaque id immediately; `status` is the pull-based polling
/// path. One session drives one job serially; jobs share no mutable state
/// beyond the store.
pub struct Dispatcher {
    store: Arc<JobStore>,
    factory: Arc<dyn SessionFactory>,
}

impl Dispatcher {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            store: Arc::new(JobStore::new()),
            factory,
        }
    }

    /// Enqueue a job and return its identifier without waiting for it.
    pub fn dispatch(&self, job: ScrapeJob) -> Uuid {
        let id = Uuid::new_v4();
        self.store.insert_pending(id);

        let store = Arc::clone(&self.store);
        let factory = Arc::clone(&self.factory);
        tokio::spawn(async move {
            store.set_running(id);
            let outcome = run_job(factory.as_ref(), &job).await;
            match &outcome {
                Ok(result) => info!("Job {} succeeded with {} rooms", id, result.schedules.len()),
                Err(e) => error!("Job {} failed: {}", id, e),
            }
            store.complete(id, outcome);
        });

        info!("Dispatched scrape job {}", id);
        id
    }

    pub fn status(&self, id: &Uuid) -> Option<JobState> {
        self.store.get(id)
    }
}

/// Run one job start to finish. The portal session is acquired here and
/// released on every exit path before the outcome is returned.
async fn run_job(factory: &dyn SessionFactory, job: &ScrapeJob) -> Result<ScrapeResult, ScrapeError> {
    let mut session = factory
        .create()
        .await
        .map_err(|e| ScrapeError::Portal(e.to_string()))?;

    let outcome = run_scrape(
        session.as_mut(),
        &job.selection,
        &job.credentials,
        &job.policy,
    )
    .await;

    session.close().await;
    outcome
}
