//! Search session: the state behind one result view.
//!
//! Owns the filter form, the current result set, the selection, the active
//! sort and the error banner. A submission moves through three steps:
//!
//! 1. [`SearchSession::begin`] builds the request, marks the session busy
//!    and issues a new request token.
//! 2. The caller runs the request on a [`SearchBackend`].
//! 3. [`SearchSession::finish`] applies the outcome, but only if the token
//!    is still the latest one issued; older completions are discarded.
//!
//! [`SearchSession::submit`] does all three. The result set and selection
//! are only ever replaced wholesale.

use crate::client::SearchBackend;
use crate::config::SearchConfig;
use crate::display;
use crate::error::{PubSearchError, Result};
use crate::export;
use crate::normalize::{self, Paper};
use crate::query::{self, OutboundRequest};
use crate::selection::SelectionSet;
use crate::sort::{self, SortField, SortSpec};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use crate::query::FilterState;

/// Keeps the session busy while alive; dropping it releases the claim on
/// every path (success, error, or an abandoned future).
#[derive(Debug)]
struct BusyGuard(Arc<AtomicUsize>);

impl BusyGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An in-flight search issued by [`SearchSession::begin`]
#[derive(Debug)]
pub struct Submission {
    token: u64,
    request: OutboundRequest,
    _busy: BusyGuard,
}

impl Submission {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn request(&self) -> &OutboundRequest {
        &self.request
    }
}

/// What happened to a finished submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// New result set installed with this many papers
    Applied(usize),
    /// A newer submission was issued meanwhile; nothing changed
    Discarded,
    /// Submission failed; the message is shown in the error banner
    Failed(String),
}

pub struct SearchSession {
    config: Arc<SearchConfig>,
    pub filters: FilterState,
    papers: Vec<Paper>,
    selection: SelectionSet,
    sort: SortSpec,
    error: Option<String>,
    in_flight: Arc<AtomicUsize>,
    latest_token: u64,
}

impl SearchSession {
    pub fn new(config: Arc<SearchConfig>) -> Self {
        Self {
            config,
            filters: FilterState::new(),
            papers: Vec::new(),
            selection: SelectionSet::new(),
            sort: SortSpec::default(),
            error: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            latest_token: 0,
        }
    }

    // === Submission ===

    /// Start a submission: build the request and take a fresh token.
    pub fn begin(&mut self) -> Result<Submission> {
        self.error = None;
        let busy = BusyGuard::acquire(&self.in_flight);

        let request = match query::build_request(&self.filters, &self.config) {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.user_message());
                return Err(e);
            }
        };

        self.latest_token += 1;
        debug!(token = self.latest_token, batch = request.is_batch(), "Submission started");
        Ok(Submission {
            token: self.latest_token,
            request,
            _busy: busy,
        })
    }

    /// Apply the outcome of `submission`.
    ///
    /// Stale submissions are discarded. On failure the previous result set
    /// stays in place, except for a malformed payload, which empties it.
    pub fn finish(&mut self, submission: Submission, outcome: Result<String>) -> SubmitOutcome {
        if submission.token != self.latest_token {
            debug!(
                token = submission.token,
                latest = self.latest_token,
                "Discarding stale search response"
            );
            return SubmitOutcome::Discarded;
        }

        let result = outcome.and_then(|body| normalize::normalize_body(&body));
        match result {
            Ok(papers) => {
                let count = papers.len();
                self.replace_results(papers);
                if display::cap_reached(count, self.config.result_cap) {
                    warn!(count = count, cap = self.config.result_cap, "Result cap reached");
                }
                SubmitOutcome::Applied(count)
            }
            Err(e) => {
                if matches!(e, PubSearchError::MalformedResponse(_)) {
                    self.replace_results(Vec::new());
                }
                warn!(error = %e, "Search failed");
                let message = e.user_message();
                self.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Run a complete submission against `backend`.
    pub async fn submit<B: SearchBackend + ?Sized>(&mut self, backend: &B) -> SubmitOutcome {
        let submission = match self.begin() {
            Ok(submission) => submission,
            Err(e) => return SubmitOutcome::Failed(e.user_message()),
        };
        let outcome = backend.execute(submission.request()).await;
        self.finish(submission, outcome)
    }

    /// True while any submission is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    // === Results ===

    fn replace_results(&mut self, papers: Vec<Paper>) {
        info!(count = papers.len(), "Replacing result set");
        self.papers = papers;
        self.selection.clear();
    }

    /// Loaded papers in arrival order
    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    /// Loaded papers in the active sort order
    pub fn sorted_papers(&self) -> Vec<Paper> {
        sort::sort(&self.papers, &self.sort)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// "Showing N results" with the narrow-your-search advisory when capped
    pub fn status_line(&self) -> Option<String> {
        display::status_line(self.papers.len(), self.config.result_cap)
    }

    pub fn is_capped(&self) -> bool {
        display::cap_reached(self.papers.len(), self.config.result_cap)
    }

    // === Sorting ===

    pub fn sort_spec(&self) -> SortSpec {
        self.sort
    }

    /// Column header click
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort.toggle(field);
    }

    // === Selection ===

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Checkbox change; ids outside the current result set are ignored
    pub fn toggle_selection(&mut self, id: &str, included: bool) {
        if included && !self.papers.iter().any(|p| p.id == id) {
            debug!(id = id, "Ignoring selection of unknown id");
            return;
        }
        self.selection.toggle(id, included);
    }

    pub fn toggle_select_all(&mut self) {
        self.selection
            .select_all(self.papers.iter().map(|p| p.id.as_str()));
    }

    pub fn all_selected(&self) -> bool {
        self.selection
            .covers_all(self.papers.iter().map(|p| p.id.as_str()))
    }

    pub fn select_all_label(&self) -> &'static str {
        display::select_all_label(self.all_selected())
    }

    // === Export ===

    /// CSV of the selected (or all) papers in display order
    pub fn export_csv(&self) -> Result<String> {
        export::export_csv(&self.sorted_papers(), &self.selection)
    }

    /// Write the export to `path`, returning the number of rows written
    pub fn export_to(&self, path: &Path) -> Result<usize> {
        export::write_csv(path, &self.sorted_papers(), &self.selection)
    }

    /// Plain-text table in display order
    pub fn render_table(&self) -> String {
        display::render_table(&self.sorted_papers(), &self.sort, &self.selection, self.is_busy())
    }

    // === Reset ===

    /// Clear the form, results, selection and error.
    pub fn reset(&mut self) {
        self.filters.reset();
        self.papers.clear();
        self.selection.clear();
        self.error = None;
        info!("Session reset");
    }
}
