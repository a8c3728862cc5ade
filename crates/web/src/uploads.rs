//! Background upload jobs.
//!
//! Submissions run as spawned tasks so the form request can return at once.
//! Each job publishes its [`UploadStatus`] on a watch channel that the status
//! page and the SSE stream read from.
//!
//! Jobs are held in a `moka` cache with an idle TTL. Cancelling a job, or
//! letting it expire, aborts its task: the in-flight request is dropped and
//! its result is never applied.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use catalog_core::{ProductId, UploadId};
use moka::future::Cache;
use moka::notification::RemovalCause;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::api::ApiError;

/// Message recorded when an upload is cancelled.
pub const CANCELLED_MESSAGE: &str = "Upload cancelled";

/// Which form started an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Product,
    Bulk,
}

impl UploadKind {
    /// Path of the form that started the upload.
    #[must_use]
    pub const fn form_path(self) -> &'static str {
        match self {
            Self::Product => "/products/new",
            Self::Bulk => "/bulk-upload",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Bulk => write!(f, "bulk"),
        }
    }
}

/// Progress and outcome of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadStatus {
    /// Started, no bytes reported yet.
    Pending,
    InProgress { percent: u8 },
    /// Accepted by the backend. Single-product uploads carry the new ID.
    Succeeded { product: Option<ProductId> },
    Failed { message: String },
    Cancelled,
}

impl UploadStatus {
    /// Whether the upload is over.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }

    /// Percentage to display.
    #[must_use]
    pub const fn percent(&self) -> u8 {
        match self {
            Self::InProgress { percent } => *percent,
            Self::Succeeded { .. } => 100,
            Self::Pending | Self::Failed { .. } | Self::Cancelled => 0,
        }
    }

    /// The result to apply to the form, once terminal.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<(), &str>> {
        match self {
            Self::Succeeded { .. } => Some(Ok(())),
            Self::Failed { message } => Some(Err(message.as_str())),
            Self::Cancelled => Some(Err(CANCELLED_MESSAGE)),
            Self::Pending | Self::InProgress { .. } => None,
        }
    }
}

/// Handle a running upload uses to report progress.
#[derive(Clone)]
pub struct ProgressSink {
    status: Arc<watch::Sender<UploadStatus>>,
}

impl ProgressSink {
    /// Publish a new percentage.
    ///
    /// Percentages never go backwards, and nothing changes once the upload is
    /// terminal.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        self.status.send_if_modified(|status| match status {
            UploadStatus::Pending => {
                *status = UploadStatus::InProgress { percent };
                true
            }
            UploadStatus::InProgress { percent: current } if percent > *current => {
                *current = percent;
                true
            }
            _ => false,
        });
    }
}

struct UploadJob {
    kind: UploadKind,
    status: Arc<watch::Sender<UploadStatus>>,
    abort: OnceLock<AbortHandle>,
}

impl UploadJob {
    fn abort(&self) {
        if let Some(handle) = self.abort.get() {
            handle.abort();
        }
    }
}

/// Registry of upload jobs.
///
/// Cheap to clone; clones share the same jobs.
#[derive(Clone)]
pub struct UploadTracker {
    jobs: Cache<UploadId, Arc<UploadJob>>,
}

impl UploadTracker {
    /// Create a tracker whose jobs expire after `ttl` without being looked at.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let jobs = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(ttl)
            .eviction_listener(|id: Arc<UploadId>, job: Arc<UploadJob>, cause| {
                if cause != RemovalCause::Replaced {
                    if !job.status.borrow().is_terminal() {
                        debug!(upload_id = %id, ?cause, "Aborting expired upload");
                    }
                    job.abort();
                }
            })
            .build();

        Self { jobs }
    }

    /// Spawn an upload task and track it under `id`.
    ///
    /// `task` receives a [`ProgressSink`] and resolves to the created
    /// product's ID, if the backend returned one. The ID is chosen by the
    /// caller so the form can be locked to it before the task starts.
    pub async fn start<F, Fut>(&self, id: UploadId, kind: UploadKind, task: F)
    where
        F: FnOnce(ProgressSink) -> Fut,
        Fut: Future<Output = Result<Option<ProductId>, ApiError>> + Send + 'static,
    {
        let (sender, _) = watch::channel(UploadStatus::Pending);
        let status = Arc::new(sender);
        let job = Arc::new(UploadJob {
            kind,
            status: Arc::clone(&status),
            abort: OnceLock::new(),
        });

        let future = task(ProgressSink {
            status: Arc::clone(&status),
        });
        let handle = tokio::spawn(async move {
            let next = match future.await {
                Ok(product) => {
                    info!(upload_id = %id, %kind, "Upload succeeded");
                    UploadStatus::Succeeded { product }
                }
                Err(e) => {
                    warn!(upload_id = %id, %kind, error = %e, "Upload failed");
                    UploadStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            finish(&status, next);
        });

        // The job is only visible once it can be aborted.
        let _ = job.abort.set(handle.abort_handle());
        self.jobs.insert(id, job).await;
    }

    /// Kind and latest status of an upload, if it is still tracked.
    pub async fn status(&self, id: UploadId) -> Option<(UploadKind, UploadStatus)> {
        let job = self.jobs.get(&id).await?;
        let status = job.status.borrow().clone();
        Some((job.kind, status))
    }

    /// Watch an upload's status.
    pub async fn subscribe(&self, id: UploadId) -> Option<watch::Receiver<UploadStatus>> {
        self.jobs.get(&id).await.map(|job| job.status.subscribe())
    }

    /// Abort an upload that has not finished yet.
    ///
    /// Returns `false` if the upload is unknown or already terminal.
    pub async fn cancel(&self, id: UploadId) -> bool {
        let Some(job) = self.jobs.get(&id).await else {
            return false;
        };
        job.abort();
        let cancelled = finish(&job.status, UploadStatus::Cancelled);
        if cancelled {
            info!(upload_id = %id, kind = %job.kind, "Upload cancelled");
        }
        cancelled
    }
}

/// Move to a terminal status unless already there.
fn finish(status: &watch::Sender<UploadStatus>, next: UploadStatus) -> bool {
    status.send_if_modified(|current| {
        if current.is_terminal() {
            return false;
        }
        *current = next;
        true
    })
}
