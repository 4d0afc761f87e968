//! Shared service state: the active model artifact and the training
//! lifecycle.
//!
//! Exactly one `ServiceState` exists per process. It is the single point of
//! interaction between the scoring loop and the control plane, and every
//! field behind it is guarded by one mutex with no nesting. The lock is only
//! ever held for field access; inference, publishing, and bus polling all
//! happen outside it.

use crate::error::PipelineError;
use crate::model::ModelArtifact;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle of the asynchronous training task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Consistent read of the service state for `/status` and result stamping.
///
/// All artifact-derived fields originate from the same artifact instance;
/// a concurrent reload can never produce a torn snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub model_version: String,
    pub trained_at: Option<String>,
    pub metrics: Option<HashMap<String, f64>>,
    pub dataset_size: Option<u64>,
    pub training_status: TrainingStatus,
    pub training_error: Option<String>,
}

struct Inner {
    artifact: Arc<ModelArtifact>,
    training_status: TrainingStatus,
    training_error: Option<String>,
}

pub struct ServiceState {
    inner: Mutex<Inner>,
    model_path: PathBuf,
}

impl ServiceState {
    /// Wrap an already-loaded initial artifact.
    pub fn new(initial: ModelArtifact, model_path: PathBuf) -> Self {
        Self {
            inner: Mutex::new(Inner {
                artifact: Arc::new(initial),
                training_status: TrainingStatus::Idle,
                training_error: None,
            }),
            model_path,
        }
    }

    /// Load the initial artifact from disk. Failure here is fatal at
    /// startup: without a model there is no valid state to serve in.
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        let artifact = ModelArtifact::load(model_path)?;
        Ok(Self::new(artifact, model_path.to_path_buf()))
    }

    /// Path `/reload` re-reads the artifact from.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// The artifact to score against. Callers clone the reference under the
    /// lock and then operate only on that snapshot, so a single scoring call
    /// can never mix fields from two artifact versions.
    pub fn current_artifact(&self) -> Arc<ModelArtifact> {
        self.inner.lock().artifact.clone()
    }

    /// Consistent view of the current artifact's metadata plus the training
    /// lifecycle fields.
    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.lock();
        StatusSnapshot {
            model_version: inner.artifact.model_version.clone(),
            trained_at: inner.artifact.trained_at.clone(),
            metrics: inner.artifact.metrics.clone(),
            dataset_size: inner.artifact.dataset_size,
            training_status: inner.training_status,
            training_error: inner.training_error.clone(),
        }
    }

    /// Replace the active artifact with one loaded from `path`.
    ///
    /// Load-then-swap: the new artifact is fully loaded and validated before
    /// the single assignment under the lock, and any failure leaves the
    /// previous artifact untouched. Never changes the training status.
    pub fn reload(&self, path: &Path) -> Result<Arc<ModelArtifact>, PipelineError> {
        let artifact = Arc::new(ModelArtifact::load(path)?);
        self.inner.lock().artifact = artifact.clone();
        Ok(artifact)
    }

    /// Claim the single training slot. Returns false (a no-op, not a queue)
    /// when a training run is already in flight.
    pub fn begin_training(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.training_status == TrainingStatus::Running {
            return false;
        }
        inner.training_status = TrainingStatus::Running;
        inner.training_error = None;
        true
    }

    /// Record the outcome of a training run.
    ///
    /// On error the status becomes `failed` with the message preserved. On
    /// success the freshly trained artifact (if any) is swapped in before the
    /// status becomes `completed`; a training run whose artifact cannot be
    /// loaded counts as failed.
    pub fn complete_training(&self, new_artifact_path: Option<&Path>, error: Option<String>) {
        if let Some(message) = error {
            let mut inner = self.inner.lock();
            inner.training_status = TrainingStatus::Failed;
            inner.training_error = Some(message);
            return;
        }

        if let Some(path) = new_artifact_path {
            if let Err(e) = self.reload(path) {
                let mut inner = self.inner.lock();
                inner.training_status = TrainingStatus::Failed;
                inner.training_error = Some(e.to_string());
                return;
            }
        }

        self.inner.lock().training_status = TrainingStatus::Completed;
    }
}
