//! Search page controller: validates form input, calls the search service,
//! and drives the page through one search action at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::entities::drug::{DrugRecord, IdenticalQuery, SearchForm, SearchResponse};
use crate::service::SearchService;

pub mod state;
pub mod view;

use state::{SearchOutcome, SearchState};
use view::{DrugCard, Panel, SearchView};

pub const FAILURE_PREFIX: &str = "오류가 발생했습니다: ";
pub const DEFAULT_FAILURE_DETAIL: &str = "검색에 실패했습니다.";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn failure_message(detail: &str) -> String {
    format!("{FAILURE_PREFIX}{detail}")
}

fn cards_for(records: &[DrugRecord]) -> (Vec<DrugCard>, String) {
    let cards: Vec<DrugCard> = records
        .iter()
        .enumerate()
        .map(|(index, record)| DrugCard::from_record(index, record))
        .collect();
    let label = view::count_label(cards.len());
    (cards, label)
}

pub struct SearchPageController<S, V> {
    service: Arc<S>,
    view: Arc<Mutex<V>>,
    state: Mutex<SearchState>,
    /// Bumped by every reset and submitted search; background lookups
    /// started under an older value are discarded.
    generation: Arc<AtomicU64>,
}

/// Restores `Idle` when a search future is dropped mid-request.
struct LoadingGuard<'a, S, V: SearchView> {
    controller: &'a SearchPageController<S, V>,
}

impl<S, V: SearchView> Drop for LoadingGuard<'_, S, V> {
    fn drop(&mut self) {
        if self.controller.state() == SearchState::Loading {
            debug!("search dropped before finishing");
            self.controller.enter(SearchState::Idle);
        }
    }
}

impl<S, V: SearchView> SearchPageController<S, V> {
    /// Last state entered: `Loading` while a search is in flight, then the
    /// terminal state of the most recent search.
    pub fn state(&self) -> SearchState {
        *lock(&self.state)
    }

    /// Runs `f` against the current view contents.
    pub fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&lock(&self.view))
    }

    fn enter(&self, next: SearchState) {
        *lock(&self.state) = next;
        let mut view = lock(&self.view);
        view.set_loading(next.loading_visible());
        view.set_submit_enabled(next.submit_enabled());
    }
}

impl<S, V> SearchPageController<S, V>
where
    S: SearchService,
    V: SearchView,
{
    pub fn new(service: Arc<S>, view: V) -> Self {
        Self {
            service,
            view: Arc::new(Mutex::new(view)),
            state: Mutex::new(SearchState::Idle),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn begin_loading(&self) -> Option<LoadingGuard<'_, S, V>> {
        {
            let mut state = lock(&self.state);
            if *state == SearchState::Loading {
                return None;
            }
            *state = SearchState::Loading;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut view = lock(&self.view);
        view.set_loading(true);
        view.set_submit_enabled(false);
        Some(LoadingGuard { controller: self })
    }

    /// Validates `form`, sends one search, and renders its result.
    ///
    /// A call made while another search is loading returns
    /// [`SearchOutcome::Busy`] without touching the page.
    pub async fn submit_search(&self, form: SearchForm) -> SearchOutcome {
        if self.state() == SearchState::Loading {
            debug!("search already in flight; ignoring submit");
            return SearchOutcome::Busy;
        }

        lock(&self.view).set_form(&form);
        let query = match form.to_query() {
            Ok(query) => query,
            Err(err) => {
                let message = err.to_string();
                lock(&self.view).show_error(&message);
                return SearchOutcome::Invalid { message };
            }
        };

        let Some(_guard) = self.begin_loading() else {
            debug!("search already in flight; ignoring submit");
            return SearchOutcome::Busy;
        };
        {
            let mut view = lock(&self.view);
            view.hide_error();
            for panel in Panel::ALL {
                view.hide_panel(panel);
            }
        }

        debug!(?query, "submitting search");
        let outcome = match self.service.search(&query).await {
            Ok(resp) => self.apply_response(resp),
            Err(err) => {
                debug!(error = %err, transport = err.is_transport(), "search failed");
                let message = failure_message(&err.to_string());
                lock(&self.view).show_error(&message);
                SearchOutcome::Failed { message }
            }
        };

        if let Some(terminal) = outcome.terminal_state() {
            self.enter(terminal);
        }
        debug!(?outcome, "search finished");
        outcome
    }

    fn apply_response(&self, resp: SearchResponse) -> SearchOutcome {
        if !resp.success {
            let detail = resp.error.as_deref().unwrap_or(DEFAULT_FAILURE_DETAIL);
            let message = failure_message(detail);
            lock(&self.view).show_error(&message);
            return SearchOutcome::Failed { message };
        }

        let panel = if resp.is_identical_search {
            Panel::Identical
        } else {
            Panel::Main
        };
        if resp.results.is_empty() {
            lock(&self.view).show_error(panel.empty_message());
            return SearchOutcome::Empty { panel };
        }

        self.render_records(&resp.results, panel);
        SearchOutcome::Success {
            panel,
            count: resp.results.len(),
        }
    }

    /// One card per record, in order; sets the panel's count label and reveals it.
    pub fn render_records(&self, records: &[DrugRecord], panel: Panel) {
        let (cards, label) = cards_for(records);
        lock(&self.view).show_panel(panel, cards, label);
    }

    /// Clears the form inputs and hides both result panels.
    pub fn reset_form(&self) {
        let mut view = lock(&self.view);
        self.generation.fetch_add(1, Ordering::SeqCst);
        view.clear_form();
        for panel in Panel::ALL {
            view.hide_panel(panel);
        }
    }
}

impl<S, V> SearchPageController<S, V>
where
    S: SearchService + 'static,
    V: SearchView + 'static,
{
    /// Background lookup of products sharing `generic_code`.
    ///
    /// Renders into the identical-ingredient panel when records come back.
    /// Failures are logged and never reach the error banner. Records that
    /// arrive after a reset or a newer search are dropped.
    pub fn load_related_records(&self, generic_code: &str) -> JoinHandle<()> {
        let service = Arc::clone(&self.service);
        let view = Arc::clone(&self.view);
        let generation = Arc::clone(&self.generation);
        let started = generation.load(Ordering::SeqCst);
        let generic_code = generic_code.to_string();

        tokio::spawn(async move {
            let query = match IdenticalQuery::new(&generic_code) {
                Ok(query) => query,
                Err(err) => {
                    warn!(%generic_code, error = %err, "skipping identical-ingredient lookup");
                    return;
                }
            };
            match service.identical(&query).await {
                Ok(resp) if resp.success && !resp.results.is_empty() => {
                    let (cards, label) = cards_for(&resp.results);
                    let mut view = lock(&view);
                    if generation.load(Ordering::SeqCst) != started {
                        debug!(%generic_code, "page changed; dropping identical-ingredient records");
                        return;
                    }
                    view.show_panel(Panel::Identical, cards, label);
                }
                Ok(resp) => {
                    debug!(
                        %generic_code,
                        success = resp.success,
                        error = resp.error.as_deref().unwrap_or_default(),
                        "no identical-ingredient records to show"
                    );
                }
                Err(err) => {
                    warn!(%generic_code, error = %err, "identical-ingredient lookup failed");
                }
            }
        })
    }
}
