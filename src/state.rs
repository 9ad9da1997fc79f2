//! Screen state for the listing and detail views.
//!
//! Nothing here touches the network or the terminal: the TUI starts a
//! request after a `begin_*` call succeeds and feeds the outcome back
//! through the matching `finish_*`.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::error::ApiResult;
use crate::merge::{candidates_heading, is_ranked, merge_candidates};
use crate::models::{JobDescription, JobSummary, MergedCandidate, NewJobDescription, ParseResponse};

/// How long the success message stays up before the dialog closes itself.
pub const DIALOG_CLOSE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Listing,
    Detail(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Description,
}

#[derive(Debug, Clone, Default)]
pub struct NewJobForm {
    pub title: String,
    pub description: String,
    pub focus: FormField,
    pub submitting: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub closes_at: Option<Instant>,
}

impl NewJobForm {
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Title,
        };
    }

    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Title => &mut self.title,
            FormField::Description => &mut self.description,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ListingState {
    pub jobs: Vec<JobSummary>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Local>>,
    pub selected: usize,
    pub dialog: Option<NewJobForm>,
}

impl ListingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false while a refresh is already running.
    pub fn begin_refresh(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.error = None;
        true
    }

    pub fn finish_refresh(&mut self, result: ApiResult<Vec<JobSummary>>) {
        self.loading = false;
        match result {
            Ok(jobs) => {
                self.jobs = jobs;
                self.last_refreshed = Some(Local::now());
                if self.selected >= self.jobs.len() {
                    self.selected = self.jobs.len().saturating_sub(1);
                }
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    pub fn selected_job(&self) -> Option<&JobSummary> {
        self.jobs.get(self.selected)
    }

    pub fn next(&mut self) {
        if !self.jobs.is_empty() && self.selected < self.jobs.len() - 1 {
            self.selected += 1;
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn open_dialog(&mut self) {
        if self.dialog.is_none() {
            self.dialog = Some(NewJobForm::default());
        }
    }

    /// Returns false if a submission is still in flight.
    pub fn close_dialog(&mut self) -> bool {
        match &self.dialog {
            Some(form) if form.submitting => false,
            _ => {
                self.dialog = None;
                true
            }
        }
    }

    /// Validates the form and marks it busy. Returns the request body to
    /// send, or `None` if nothing should be sent.
    pub fn begin_submit(&mut self) -> Option<NewJobDescription> {
        let form = self.dialog.as_mut()?;
        if form.submitting || form.closes_at.is_some() {
            return None;
        }
        form.error = None;
        form.success = None;
        if !form.is_complete() {
            form.error = Some("Job title and description are both required".to_string());
            return None;
        }
        form.submitting = true;
        Some(NewJobDescription {
            job_title: form.title.clone(),
            job_description: form.description.clone(),
        })
    }

    pub fn finish_submit(&mut self, result: ApiResult<ParseResponse>, now: Instant) {
        let Some(form) = self.dialog.as_mut() else { return };
        form.submitting = false;
        match result {
            Ok(resp) => {
                form.success = Some(resp.message);
                form.title.clear();
                form.description.clear();
                form.focus = FormField::Title;
                form.closes_at = Some(now + DIALOG_CLOSE_DELAY);
            }
            Err(e) => form.error = Some(e.to_string()),
        }
    }

    /// Closes a dialog whose success delay has elapsed. Returns true when
    /// that happened, meaning the listing should be refetched.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = matches!(&self.dialog, Some(NewJobForm { closes_at: Some(at), .. }) if now >= *at);
        if due {
            self.dialog = None;
        }
        due
    }
}

/// Which long-running action is in flight on the detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Fetching,
    Ranking,
}

impl Activity {
    pub fn message(&self) -> &'static str {
        match self {
            Activity::Fetching => "Fetching candidates from GitHub...",
            Activity::Ranking => "Ranking candidates based on job requirements...",
        }
    }
}

#[derive(Debug)]
pub struct DetailState {
    pub job_id: String,
    pub job: Option<JobDescription>,
    pub loading: bool,
    pub fetching: bool,
    pub ranking: bool,
    pub error: Option<String>,
    pub scroll: u16,
}

impl DetailState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            job: None,
            loading: false,
            fetching: false,
            ranking: false,
            error: None,
            scroll: 0,
        }
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn finish_load(&mut self, result: ApiResult<JobDescription>) {
        self.loading = false;
        self.apply(result);
    }

    pub fn can_fetch_candidates(&self) -> bool {
        match &self.job {
            Some(job) => !self.fetching && !job.candidates_fetched,
            None => false,
        }
    }

    pub fn can_rank_candidates(&self) -> bool {
        match &self.job {
            Some(job) => !self.ranking && job.candidates_fetched && !job.candidates_ranked,
            None => false,
        }
    }

    pub fn begin_fetch_candidates(&mut self) -> bool {
        if !self.can_fetch_candidates() {
            return false;
        }
        self.fetching = true;
        self.error = None;
        true
    }

    pub fn finish_fetch_candidates(&mut self, result: ApiResult<JobDescription>) {
        self.fetching = false;
        self.apply(result);
    }

    pub fn begin_rank_candidates(&mut self) -> bool {
        if !self.can_rank_candidates() {
            return false;
        }
        self.ranking = true;
        self.error = None;
        true
    }

    pub fn finish_rank_candidates(&mut self, result: ApiResult<JobDescription>) {
        self.ranking = false;
        self.apply(result);
    }

    fn apply(&mut self, result: ApiResult<JobDescription>) {
        match result {
            Ok(job) => {
                self.job = Some(job);
                self.scroll = 0;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    pub fn activity(&self) -> Option<Activity> {
        if self.fetching {
            Some(Activity::Fetching)
        } else if self.ranking {
            Some(Activity::Ranking)
        } else {
            None
        }
    }

    pub fn is_ranked(&self) -> bool {
        self.job.as_ref().is_some_and(is_ranked)
    }

    pub fn merged(&self) -> Vec<MergedCandidate> {
        self.job.as_ref().map(merge_candidates).unwrap_or_default()
    }

    pub fn heading(&self) -> String {
        candidates_heading(self.is_ranked(), self.merged().len())
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(3);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(3);
    }
}
