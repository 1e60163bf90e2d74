//! Lifecycle of a single analysis job: submission, status polling, terminal
//! resolution.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::{AnalysisResult, ScholarApi, StatusResponse, TaskStatus};
use crate::error::{Result, ScholarError};

/// One analysis job as last reported by the backend.
///
/// The record is replaced wholesale on every poll response, never merged.
/// `result` is present only when completed; `error` only when failed.
#[derive(Debug, Clone)]
pub struct Task {
    /// Opaque backend identifier, stable for the lifetime of one analysis
    pub id: String,
    pub status: TaskStatus,
    /// Human-readable progress label, if the backend reports one
    pub stage: Option<String>,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

impl Task {
    fn accepted(id: String) -> Self {
        Self {
            id,
            status: TaskStatus::Accepted,
            stage: None,
            result: None,
            error: None,
        }
    }

    /// Build the replacement record for a poll response.
    ///
    /// A completed response whose payload does not decode as an analysis
    /// result is demoted to failed; the payload of a failed response is kept
    /// opaque and rendered as the error text.
    fn from_status(id: String, response: StatusResponse) -> Self {
        match response.status {
            TaskStatus::Completed => match response
                .result
                .ok_or_else(|| "completed task carried no result payload".to_string())
                .and_then(|value| {
                    serde_json::from_value::<AnalysisResult>(value)
                        .map_err(|e| format!("malformed analysis result: {}", e))
                }) {
                Ok(result) => Self {
                    id,
                    status: TaskStatus::Completed,
                    stage: response.stage,
                    result: Some(result),
                    error: None,
                },
                Err(reason) => Self {
                    id,
                    status: TaskStatus::Failed,
                    stage: response.stage,
                    result: None,
                    error: Some(reason),
                },
            },
            TaskStatus::Failed => {
                let reason = match response.result {
                    Some(serde_json::Value::String(text)) => text,
                    Some(other) => other.to_string(),
                    None => "analysis failed".to_string(),
                };
                Self {
                    id,
                    status: TaskStatus::Failed,
                    stage: response.stage,
                    result: None,
                    error: Some(reason),
                }
            }
            status => Self {
                id,
                status,
                stage: response.stage,
                result: None,
                error: None,
            },
        }
    }
}

/// Where the session machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Failed)
    }
}

/// Receipt for one accepted submission.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub task_id: String,
    pub submitted_at: DateTime<Utc>,
}

struct Shared {
    task: RwLock<Option<Task>>,
    last_error: RwLock<Option<String>>,
    state_tx: watch::Sender<LifecycleState>,
}

/// Owns the state machine for one analysis job at a time.
///
/// Submission obtains a task id and starts the polling loop; each successful
/// poll replaces the task record wholesale and a terminal status stops the
/// loop permanently. A failed poll aborts the session as failed with no
/// automatic retry. At most one polling timer is ever active: submitting
/// again (or `cancel`) stops the previous loop before anything else happens,
/// and every loop carries the generation current at its dispatch so a
/// superseded loop can never write into a newer session.
pub struct TaskLifecycleController {
    api: Arc<dyn ScholarApi>,
    poll_interval: Duration,
    generation: Arc<AtomicU64>,
    shared: Arc<Shared>,
    state_rx: watch::Receiver<LifecycleState>,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskLifecycleController {
    pub fn new(api: Arc<dyn ScholarApi>, poll_interval: Duration) -> Self {
        let (state_tx, state_rx) = watch::channel(LifecycleState::Idle);
        Self {
            api,
            poll_interval,
            generation: Arc::new(AtomicU64::new(0)),
            shared: Arc::new(Shared {
                task: RwLock::new(None),
                last_error: RwLock::new(None),
                state_tx,
            }),
            state_rx,
            poll_handle: Mutex::new(None),
        }
    }

    /// Submit a source URL for analysis and start polling for its status.
    ///
    /// Any previous session is cancelled first. On a submission failure the
    /// controller lands in `Failed` without ever holding a task id.
    pub async fn submit(&self, source_url: &str) -> Result<TaskHandle> {
        self.cancel().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        *self.shared.task.write().await = None;
        *self.shared.last_error.write().await = None;
        self.shared.state_tx.send_replace(LifecycleState::Submitting);

        let submitted = match self.api.submit(source_url).await {
            Ok(response) => response,
            Err(e) => {
                let error = ScholarError::Submission {
                    url: source_url.to_string(),
                    reason: e.to_string(),
                };
                warn!("❌ {}", error);
                *self.shared.last_error.write().await = Some(error.to_string());
                self.shared.state_tx.send_replace(LifecycleState::Failed);
                return Err(error);
            }
        };

        info!("🎯 Analysis job accepted: task {}", submitted.task_id);
        *self.shared.task.write().await = Some(Task::accepted(submitted.task_id.clone()));
        self.shared.state_tx.send_replace(LifecycleState::Polling);

        let handle = self.spawn_poll_loop(submitted.task_id.clone(), generation);
        *self.poll_handle.lock().await = Some(handle);

        Ok(TaskHandle {
            task_id: submitted.task_id,
            submitted_at: Utc::now(),
        })
    }

    fn spawn_poll_loop(&self, task_id: String, generation: u64) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.shared);
        let generations = Arc::clone(&self.generation);
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately; the
            // first status check belongs one full interval after submission.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let response = api.status(&task_id).await;
                if generations.load(Ordering::SeqCst) != generation {
                    debug!("Discarding status response for superseded task {}", task_id);
                    return;
                }

                match response {
                    Ok(status_response) => {
                        let task = Task::from_status(task_id.clone(), status_response);
                        let status = task.status;
                        *shared.task.write().await = Some(task);

                        match status {
                            TaskStatus::Completed => {
                                info!("✅ Task {} completed", task_id);
                                shared.state_tx.send_replace(LifecycleState::Completed);
                                return;
                            }
                            TaskStatus::Failed => {
                                warn!("❌ Task {} failed", task_id);
                                shared.state_tx.send_replace(LifecycleState::Failed);
                                return;
                            }
                            _ => {}
                        }
                    }
                    Err(e) => {
                        let error = ScholarError::Polling {
                            task_id: task_id.clone(),
                            reason: e.to_string(),
                        };
                        warn!("❌ {}", error);
                        *shared.last_error.write().await = Some(error.to_string());
                        shared.state_tx.send_replace(LifecycleState::Failed);
                        return;
                    }
                }
            }
        })
    }

    /// Stop the polling timer, if one is running.
    ///
    /// In-flight status requests are not aborted mid-transfer; the
    /// generation bump guarantees their responses are discarded on arrival.
    pub async fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.poll_handle.lock().await.take() {
            handle.abort();
            debug!("Stopped polling timer");
        }
    }

    /// The task as last reported, if a submission has been accepted.
    pub async fn snapshot(&self) -> Option<Task> {
        self.shared.task.read().await.clone()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state_rx.borrow()
    }

    /// The submission or polling error that ended the session, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.shared.last_error.read().await.clone()
    }

    /// Wait until the session reaches `Completed` or `Failed`.
    pub async fn wait_terminal(&self) -> LifecycleState {
        let mut rx = self.state_rx.clone();
        let result = rx.wait_for(|state| state.is_terminal()).await;
        match result {
            Ok(state) => *state,
            // The sender lives on self, so the channel cannot close while
            // we are borrowed; fall back to the current state regardless.
            Err(_) => self.state(),
        }
    }
}

impl Drop for TaskLifecycleController {
    fn drop(&mut self) {
        // Tear down the timer if the owner never cancelled explicitly.
        if let Ok(mut guard) = self.poll_handle.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
