//! Paginated job-history view model.
//!
//! A stable window over the authenticated user's jobs, independent of the
//! upload pipeline's lifecycle: a completed upload never refreshes this view
//! on its own. Responses are applied through a monotonically increasing
//! request sequence, so a late response for a page the user has already
//! navigated away from is discarded instead of clobbering the list.

use std::sync::{Arc, Mutex};

use restora_core::{ClientError, Job, JOB_PAGE_SIZE};

use crate::api::RestorationApi;

struct HistoryState {
    jobs: Vec<Job>,
    page: u32,
    total_pages: u32,
    loading: bool,
    refreshing: bool,
    error: Option<String>,
    /// Bumped per request; a response is applied only when it still matches.
    seq: u64,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            page: 1,
            total_pages: 1,
            loading: false,
            refreshing: false,
            error: None,
            seq: 0,
        }
    }
}

/// Rendered projection of the history window.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub jobs: Vec<Job>,
    pub page: u32,
    pub total_pages: u32,
    pub loading: bool,
    pub refreshing: bool,
    /// List-scoped fetch failure; never a global error.
    pub error: Option<String>,
    pub can_previous: bool,
    pub can_next: bool,
}

pub struct JobHistory {
    api: Arc<dyn RestorationApi>,
    state: Mutex<HistoryState>,
}

impl JobHistory {
    pub fn new(api: Arc<dyn RestorationApi>) -> Self {
        Self {
            api,
            state: Mutex::new(HistoryState::default()),
        }
    }

    /// Fetch one page and, if this request is still the latest when the
    /// response lands, replace the displayed window wholesale. On failure
    /// the prior list stays visible behind an inline error.
    ///
    /// Authorization rejections propagate to the caller (the session is
    /// already gone) and are never recorded inline.
    pub async fn fetch_page(&self, page: u32) -> Result<(), ClientError> {
        let seq = {
            let mut state = self.state.lock().unwrap();
            state.seq += 1;
            state.loading = true;
            state.error = None;
            state.seq
        };

        let result = self.api.list_jobs(page, JOB_PAGE_SIZE).await;

        let mut state = self.state.lock().unwrap();
        if state.seq != seq {
            tracing::debug!(page, "Discarding stale job-list response");
            return Ok(());
        }
        state.loading = false;
        state.refreshing = false;

        match result {
            Ok(envelope) => {
                state.jobs = envelope.data;
                state.total_pages = envelope.last_page.max(1);
                state.page = page;
                Ok(())
            }
            Err(err) if err.is_auth_rejection() => Err(err),
            Err(err) => {
                tracing::debug!("Failed to fetch jobs: {}", err);
                state.error = Some("Failed to load jobs.".to_string());
                Err(err)
            }
        }
    }

    /// Re-fetch the current page. Behaviorally identical to a page change;
    /// only the `refreshing` presentation flag differs.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let page = {
            let mut state = self.state.lock().unwrap();
            if state.loading {
                return Ok(());
            }
            state.refreshing = true;
            state.page
        };
        self.fetch_page(page).await
    }

    /// Disabled at the last known page and while a fetch is in flight.
    pub async fn next_page(&self) -> Result<(), ClientError> {
        let target = {
            let state = self.state.lock().unwrap();
            if state.loading || state.page >= state.total_pages {
                return Ok(());
            }
            state.page + 1
        };
        self.fetch_page(target).await
    }

    /// Disabled at page 1 and while a fetch is in flight.
    pub async fn previous_page(&self) -> Result<(), ClientError> {
        let target = {
            let state = self.state.lock().unwrap();
            if state.loading || state.page <= 1 {
                return Ok(());
            }
            state.page - 1
        };
        self.fetch_page(target).await
    }

    pub fn snapshot(&self) -> HistoryView {
        let state = self.state.lock().unwrap();
        HistoryView {
            jobs: state.jobs.clone(),
            page: state.page,
            total_pages: state.total_pages,
            loading: state.loading,
            refreshing: state.refreshing,
            error: state.error.clone(),
            can_previous: state.page > 1 && !state.loading,
            can_next: state.page < state.total_pages && !state.loading,
        }
    }
}
