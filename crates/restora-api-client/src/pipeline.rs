//! Upload orchestration state machine.
//!
//! One live attempt per pipeline instance, driven through a fixed stage
//! sequence: Idle → Selected → UploadingToStore → RegisteringJob → Accepted,
//! with Error reachable from the two network stages and from local
//! validation. There are no automatic retries, no client-side timeouts, and
//! no cancellation of in-flight calls: abandoning an attempt bumps a
//! monotonically increasing attempt id, and results are committed only if
//! their attempt is still current, so a stale response can never resurrect a
//! reset pipeline.

use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use restora_core::{ClientError, CreateJobRequest, SelectedFile, StoreUploadRequest};

use crate::api::RestorationApi;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadStage {
    #[default]
    Idle,
    Selected,
    UploadingToStore,
    RegisteringJob,
    Accepted,
    Error,
}

impl std::fmt::Display for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStage::Idle => write!(f, "idle"),
            UploadStage::Selected => write!(f, "selected"),
            UploadStage::UploadingToStore => write!(f, "uploading to store"),
            UploadStage::RegisteringJob => write!(f, "registering job"),
            UploadStage::Accepted => write!(f, "accepted"),
            UploadStage::Error => write!(f, "error"),
        }
    }
}

#[derive(Default)]
struct PipelineState {
    stage: UploadStage,
    /// Bumped on every select/reset; in-flight results are committed only
    /// when their attempt still matches.
    attempt: u64,
    file: Option<SelectedFile>,
    remote_key: Option<String>,
    error: Option<String>,
}

/// Rendered projection of the current attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadView {
    pub stage: UploadStage,
    pub file_name: Option<String>,
    pub remote_key: Option<String>,
    pub error: Option<String>,
}

pub struct UploadPipeline {
    api: Arc<dyn RestorationApi>,
    state: Mutex<PipelineState>,
}

impl UploadPipeline {
    pub fn new(api: Arc<dyn RestorationApi>) -> Self {
        Self {
            api,
            state: Mutex::new(PipelineState::default()),
        }
    }

    /// File selection (picker or drop). Only the first file of a multi-file
    /// selection is kept; an empty list is a no-op. Re-selecting from any
    /// later stage silently discards the prior attempt's remote artifacts;
    /// no cleanup call is made for an already-staged blob.
    pub fn select_files(&self, files: Vec<SelectedFile>) {
        let Some(file) = files.into_iter().next() else {
            return;
        };
        let mut state = self.state.lock().unwrap();
        state.attempt += 1;
        state.stage = UploadStage::Selected;
        state.file = Some(file);
        state.remote_key = None;
        state.error = None;
    }

    /// Recovery action from the Error state: back to Idle with nothing
    /// selected. The user re-selects and re-uploads from scratch; a prior
    /// attempt's storage key is never reused.
    pub fn try_again(&self) {
        let mut state = self.state.lock().unwrap();
        if state.stage != UploadStage::Error {
            return;
        }
        state.attempt += 1;
        state.stage = UploadStage::Idle;
        state.file = None;
        state.remote_key = None;
        state.error = None;
    }

    /// Dismiss the success confirmation, discarding the concluded attempt.
    pub fn acknowledge(&self) {
        let mut state = self.state.lock().unwrap();
        if state.stage != UploadStage::Accepted {
            return;
        }
        state.attempt += 1;
        state.stage = UploadStage::Idle;
        state.file = None;
        state.remote_key = None;
        state.error = None;
    }

    pub fn snapshot(&self) -> UploadView {
        let state = self.state.lock().unwrap();
        UploadView {
            stage: state.stage,
            file_name: state.file.as_ref().map(|f| f.name.clone()),
            remote_key: state.remote_key.clone(),
            error: state.error.clone(),
        }
    }

    /// Drive the selected file through the two network stages.
    ///
    /// Every failure requires explicit user action to proceed; the returned
    /// error is also recorded in the Error state, except authorization
    /// rejections, which belong to the global session layer and are never
    /// rendered inline.
    pub async fn upload(&self) -> Result<(), ClientError> {
        let (attempt, file) = {
            let mut state = self.state.lock().unwrap();
            let file = match (&state.stage, &state.file) {
                (UploadStage::Selected, Some(file)) => file.clone(),
                _ => return Err(ClientError::Validation("No file selected".to_string())),
            };
            state.stage = UploadStage::UploadingToStore;
            state.error = None;
            (state.attempt, file)
        };

        // Stage-local validation: nothing leaves the client without a
        // usable extension.
        let Some(ext) = file.extension() else {
            let err = ClientError::Validation("Could not detect file extension".to_string());
            self.fail(attempt, &err);
            return Err(err);
        };

        let request = StoreUploadRequest {
            file: BASE64.encode(&file.bytes),
            ext,
        };
        let staged = match self.api.stage_file(&request).await {
            Ok(staged) => staged,
            Err(err) => {
                self.fail(attempt, &err);
                return Err(err);
            }
        };

        let key = staged.key;
        tracing::debug!(key = %key, "File staged in blob store");
        let advanced = self.commit(attempt, |state| {
            state.remote_key = Some(key.clone());
            state.stage = UploadStage::RegisteringJob;
        });
        if !advanced {
            // Attempt was abandoned while the store call was in flight; its
            // key is dropped on the floor (the orphaned blob is tolerated).
            return Ok(());
        }

        let request = CreateJobRequest {
            key,
            file_name: file.name.clone(),
        };
        if let Err(err) = self.api.register_job(&request).await {
            // The blob write already succeeded and is not rolled back;
            // re-running the whole pipeline is the only retry path.
            self.fail(attempt, &err);
            return Err(err);
        }

        self.commit(attempt, |state| {
            state.stage = UploadStage::Accepted;
        });
        Ok(())
    }

    /// Apply a state change only if the attempt is still the live one.
    fn commit(&self, attempt: u64, apply: impl FnOnce(&mut PipelineState)) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.attempt != attempt {
            tracing::debug!(attempt, "Discarding result from abandoned attempt");
            return false;
        }
        apply(&mut state);
        true
    }

    fn fail(&self, attempt: u64, err: &ClientError) {
        if err.is_auth_rejection() {
            // The shared request layer has already cleared the session; the
            // caller redirects rather than showing an inline dialog.
            return;
        }
        self.commit(attempt, |state| {
            state.stage = UploadStage::Error;
            state.error = Some(err.user_message());
        });
    }
}
