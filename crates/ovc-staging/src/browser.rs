//! Object browser: the single sequencing point for a staged view.
//!
//! Every mutation of the staged set, the page window, the cache and the
//! status line happens while holding one state lock, and that lock is never
//! held across an await. Remote fetches run outside the lock and are tagged
//! with a generation number; a fetch whose generation is no longer current
//! when it resolves is discarded instead of committed.
//!
//! ```text
//! search / reload ──► bump generation, clear store ──► execute (unlocked)
//!                                                        │
//!                      discard if superseded ◄───────────┤
//!                      cache + load + sort + status ◄────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use ovc_core::logging;
use ovc_core::{
    parse_page_size, BrowserConfig, CatalogMutation, Error, ManagedObject, MutationRequest,
    ObjectType, QueryExecutor, QueryKind, QuerySignature, Result, SearchColumn, SortField,
    SortSpec,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn, Span};

use crate::cache::{CacheStats, CachedRows, QueryCache};
use crate::coordinator::{ActionEligibility, ObjectAction, ObjectStateCoordinator, RefreshPlan};
use crate::filter::{AppliedFilter, FilterDecision, SearchFilterController};
use crate::status::{StatusBoard, StatusKind, StatusView};
use crate::store::{PageRow, ResultStagingStore};

/// Message shown while a fetch is outstanding.
pub const LOADING_MESSAGE: &str = "Loading...";

/// Warning posted when a sort is requested on an empty view.
pub const NO_DATA_TO_SORT: &str = "No data available to sort";

/// Rejection while a checkout or checkin is already running.
pub const MUTATION_IN_PROGRESS: &str = "Another checkout or checkin is in progress";

/// Rejection when an export finds no source.
pub const DDL_NOT_FOUND: &str = "DDL not found";

/// How a fetch request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Results were committed to the staged view.
    Loaded { count: usize, from_cache: bool },
    /// Identical to the last applied search; nothing was fetched.
    Suppressed,
    /// A newer request took over before this one resolved.
    Superseded,
}

/// The object targeted by checkout, checkin and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionView {
    pub name: String,
    pub object_type: ObjectType,
    /// Whether the selection is part of the current staged set.
    pub staged: bool,
    pub comment: String,
    pub eligibility: ActionEligibility,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct BrowserSnapshot {
    pub rows: Vec<PageRow>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub page_size: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub sort: SortSpec,
    pub sort_label: String,
    pub busy: bool,
    pub status: Option<StatusView>,
    pub selection: Option<SelectionView>,
}

#[derive(Debug)]
struct BrowserState {
    store: ResultStagingStore,
    cache: QueryCache,
    filter: SearchFilterController,
    sort: SortSpec,
    generation: u64,
    in_flight: bool,
    mutating: bool,
    status: StatusBoard,
    selection: Option<(String, ObjectType)>,
}

/// Browses, searches, sorts and pages the catalog, and coordinates
/// checkout/checkin against it.
pub struct ObjectBrowser {
    executor: Arc<dyn QueryExecutor>,
    mutations: Arc<dyn CatalogMutation>,
    config: BrowserConfig,
    coordinator: ObjectStateCoordinator,
    state: Mutex<BrowserState>,
}

impl ObjectBrowser {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        mutations: Arc<dyn CatalogMutation>,
        config: BrowserConfig,
    ) -> Self {
        let state = BrowserState {
            store: ResultStagingStore::new(config.page_size),
            cache: QueryCache::new(),
            filter: SearchFilterController::new(),
            sort: config.default_sort,
            generation: 0,
            in_flight: false,
            mutating: false,
            status: StatusBoard::new(),
            selection: None,
        };
        Self {
            executor,
            mutations,
            coordinator: ObjectStateCoordinator::new(config.current_user.clone()),
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn current_user(&self) -> &str {
        self.coordinator.current_user()
    }

    fn state(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // FETCHING
    // =========================================================================

    /// Reload the objects checked out by the current user.
    #[instrument(skip(self), fields(
        subsystem = "staging",
        component = "browser",
        op = "user_checkouts",
        generation = tracing::field::Empty,
    ))]
    pub async fn load_user_checkouts(&self) -> Result<FetchOutcome> {
        let kind = QueryKind::UserCheckouts {
            user: self.config.current_user.clone(),
        };
        self.run_fetch(kind, None).await
    }

    /// Validated, de-duplicated column search.
    #[instrument(skip(self), fields(
        subsystem = "staging",
        component = "browser",
        op = "search",
        generation = tracing::field::Empty,
    ))]
    pub async fn search(&self, column: SearchColumn, term: &str) -> Result<FetchOutcome> {
        let kind = {
            let mut state = self.state();
            let decision = state.filter.decide(column, term);
            match decision {
                Ok(FilterDecision::Suppressed) => return Ok(FetchOutcome::Suppressed),
                Ok(FilterDecision::Execute(filter)) => QueryKind::Search {
                    filter,
                    sort: state.sort,
                },
                Err(e) => {
                    state
                        .status
                        .post(StatusKind::Warning, e.user_message(), self.config.status_ttl);
                    return Err(e);
                }
            }
        };
        let applied = AppliedFilter {
            column,
            term: term.trim().to_string(),
        };
        self.run_fetch(kind, Some(applied)).await
    }

    /// Force a refetch of the current view, bypassing cache and de-duplication.
    #[instrument(skip(self), fields(subsystem = "staging", component = "browser", op = "refresh"))]
    pub async fn refresh(&self) -> Result<FetchOutcome> {
        let plan = {
            let mut state = self.state();
            state.filter.forget_last_applied();
            state.cache.invalidate();
            self.coordinator.refresh_plan(state.filter.active_filter())
        };
        self.follow_plan(plan).await
    }

    /// Clear the search and reload the whole inventory.
    #[instrument(skip(self), fields(
        subsystem = "staging",
        component = "browser",
        op = "reload_all",
        generation = tracing::field::Empty,
    ))]
    pub async fn reload_all(&self) -> Result<FetchOutcome> {
        let kind = {
            let mut state = self.state();
            state.cache.invalidate();
            QueryKind::All { sort: state.sort }
        };
        self.run_fetch(kind, None).await
    }

    async fn follow_plan(&self, plan: RefreshPlan) -> Result<FetchOutcome> {
        match plan {
            RefreshPlan::ReloadUserView => self.load_user_checkouts().await,
            RefreshPlan::ReapplyFilter(filter) => {
                self.state().filter.forget_last_applied();
                self.search(filter.column, &filter.term).await
            }
        }
    }

    /// Reset the view, fetch `kind`, and commit the rows unless superseded.
    async fn run_fetch(
        &self,
        kind: QueryKind,
        applied: Option<AppliedFilter>,
    ) -> Result<FetchOutcome> {
        let signature = kind.signature();
        let generation = {
            let mut state = self.state();
            state.generation += 1;
            let generation = state.generation;
            Span::current().record(logging::GENERATION, generation);
            state.store.clear();
            if applied.is_none() {
                state.filter.clear();
            } else {
                // The view no longer reflects the last applied search.
                state.filter.forget_last_applied();
            }

            if let Some(rows) = state.cache.get(&signature) {
                debug!(query = %signature, generation, "Serving fetch from cache");
                state.in_flight = false;
                let count = self.commit(&mut state, &kind, rows, applied);
                return Ok(FetchOutcome::Loaded {
                    count,
                    from_cache: true,
                });
            }

            state.in_flight = true;
            state.status.progress(LOADING_MESSAGE);
            generation
        };

        let start = Instant::now();
        let result = self.executor.execute(&signature).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let mut state = self.state();
        if state.generation != generation {
            let stale = Error::StaleResult {
                generation,
                current: state.generation,
            };
            debug!(query = %signature, duration_ms, "{}", stale);
            return Ok(FetchOutcome::Superseded);
        }
        state.in_flight = false;

        match result {
            Ok(rows) => {
                let rows: CachedRows = Arc::new(rows);
                state.cache.put(signature, Arc::clone(&rows));
                let count = self.commit(&mut state, &kind, rows, applied);
                info!(
                    op = kind.op(),
                    generation,
                    result_count = count,
                    duration_ms,
                    "Fetch completed"
                );
                Ok(FetchOutcome::Loaded {
                    count,
                    from_cache: false,
                })
            }
            Err(e) => {
                warn!(op = kind.op(), generation, error = %e, duration_ms, "Fetch failed");
                state
                    .status
                    .post(StatusKind::Error, e.user_message(), self.config.status_ttl);
                Err(e)
            }
        }
    }

    fn commit(
        &self,
        state: &mut BrowserState,
        kind: &QueryKind,
        rows: CachedRows,
        applied: Option<AppliedFilter>,
    ) -> usize {
        state.store.load(&rows);
        let sort = state.sort;
        state.store.apply_sort(sort);
        if let Some(filter) = applied {
            state.filter.mark_applied(filter.column, &filter.term);
        }

        let count = state.store.total_records();
        state
            .status
            .post(StatusKind::Success, summary(kind, count), self.config.status_ttl);
        count
    }

    /// Look up every type stored under `name`, matched case-insensitively on
    /// the whole name.
    ///
    /// Shares the query cache with the list fetches but never touches the
    /// staged view or the fetch generation.
    #[instrument(skip(self), fields(
        subsystem = "staging",
        component = "browser",
        op = "object_status",
    ))]
    pub async fn object_status(&self, name: &str) -> Result<Vec<ManagedObject>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Enter the object name"));
        }
        let signature = QueryKind::ObjectStatus {
            name: name.to_string(),
        }
        .signature();

        let cached = self.state().cache.get(&signature);
        let rows = match cached {
            Some(rows) => rows,
            None => match self.executor.execute(&signature).await {
                Ok(rows) => {
                    let rows: CachedRows = Arc::new(rows);
                    self.state().cache.put(signature, Arc::clone(&rows));
                    rows
                }
                Err(e) => {
                    warn!(object_name = %name, error = %e, "Status lookup failed");
                    self.state()
                        .status
                        .post(StatusKind::Error, e.user_message(), self.config.status_ttl);
                    return Err(e);
                }
            },
        };

        Ok(rows
            .iter()
            .map(ManagedObject::from_row)
            .filter(|o| o.name.eq_ignore_ascii_case(name))
            .collect())
    }

    // =========================================================================
    // SORTING
    // =========================================================================

    /// Sort by `field`; the current field toggles direction, a new field
    /// keeps it. Returns whether the view was re-sorted.
    pub fn sort_by(&self, field: SortField) -> bool {
        let mut state = self.state();
        let spec = if state.sort.field == field {
            state.sort.toggled()
        } else {
            SortSpec::new(field, state.sort.ascending)
        };
        self.apply_sort(&mut state, spec)
    }

    /// Change only the direction. No-op when unchanged.
    pub fn set_sort_direction(&self, ascending: bool) -> bool {
        let mut state = self.state();
        if state.sort.ascending == ascending {
            return false;
        }
        let spec = SortSpec::new(state.sort.field, ascending);
        self.apply_sort(&mut state, spec)
    }

    fn apply_sort(&self, state: &mut BrowserState, spec: SortSpec) -> bool {
        if state.in_flight {
            // The outstanding fetch sorts with the newest spec on commit.
            debug!(sort = %spec, "Sort recorded for in-flight fetch");
            state.sort = spec;
            return false;
        }
        if state.store.is_empty() {
            state
                .status
                .post(StatusKind::Warning, NO_DATA_TO_SORT, self.config.status_ttl);
            return false;
        }

        let start = Instant::now();
        state.sort = spec;
        state.store.apply_sort(spec);
        let count = state.store.total_records();
        debug!(
            sort = %spec,
            result_count = count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Staged set sorted"
        );
        state.status.post(
            StatusKind::Success,
            format!("Sorted by {} - {} items", spec.label(), count),
            self.config.sort_status_ttl,
        );
        true
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.state().sort
    }

    // =========================================================================
    // PAGING
    // =========================================================================

    pub fn next_page(&self) -> bool {
        self.state().store.next_page()
    }

    pub fn previous_page(&self) -> bool {
        self.state().store.previous_page()
    }

    pub fn first_page(&self) -> bool {
        self.state().store.first_page()
    }

    pub fn last_page(&self) -> bool {
        self.state().store.last_page()
    }

    pub fn go_to_page(&self, n: usize) -> bool {
        self.state().store.go_to_page(n)
    }

    pub fn can_go_previous(&self) -> bool {
        self.state().store.window().can_go_previous()
    }

    pub fn can_go_next(&self) -> bool {
        self.state().store.window().can_go_next()
    }

    /// Apply a user-entered page size; invalid input falls back to the
    /// default. Returns the size in effect.
    pub fn set_page_size_text(&self, text: &str) -> usize {
        let size = parse_page_size(text);
        let mut state = self.state();
        state.store.set_page_size(size);
        debug!(page_size = size, total_pages = state.store.total_pages(), "Page size changed");
        size
    }

    pub fn page(&self) -> Vec<PageRow> {
        self.state().store.page()
    }

    // =========================================================================
    // SELECTION AND MUTATION
    // =========================================================================

    /// Target `name`/`object_type` for checkout, checkin and export.
    ///
    /// The name does not have to be staged; unstaged selections get no
    /// enabled actions and are validated by the remote side.
    pub fn select(&self, name: &str, object_type: ObjectType) -> SelectionView {
        let mut state = self.state();
        let view = self.describe(&state, name.trim(), &object_type);
        state.selection = Some((view.name.clone(), view.object_type.clone()));
        view
    }

    pub fn clear_selection(&self) {
        self.state().selection = None;
    }

    fn selection_view(&self, state: &BrowserState) -> Option<SelectionView> {
        let (name, object_type) = state.selection.as_ref()?;
        Some(self.describe(state, name, object_type))
    }

    fn describe(
        &self,
        state: &BrowserState,
        name: &str,
        object_type: &ObjectType,
    ) -> SelectionView {
        match state.store.find(name, object_type) {
            Some(object) => SelectionView {
                name: object.name.clone(),
                object_type: object.object_type.clone(),
                staged: true,
                comment: object.comment.clone(),
                eligibility: self.coordinator.evaluate(object),
            },
            None => SelectionView {
                name: name.to_string(),
                object_type: object_type.clone(),
                staged: false,
                comment: String::new(),
                eligibility: ActionEligibility::default(),
            },
        }
    }

    /// Check out the selected object.
    #[instrument(skip(self, comment), fields(
        subsystem = "staging",
        component = "browser",
        op = "checkout",
    ))]
    pub async fn checkout(&self, comment: &str) -> Result<()> {
        self.mutate(ObjectAction::Checkout, comment).await
    }

    /// Check in the selected object.
    #[instrument(skip(self, comment), fields(
        subsystem = "staging",
        component = "browser",
        op = "checkin",
    ))]
    pub async fn checkin(&self, comment: &str) -> Result<()> {
        self.mutate(ObjectAction::Checkin, comment).await
    }

    async fn mutate(&self, action: ObjectAction, comment: &str) -> Result<()> {
        let (req, known) = {
            let mut state = self.state();
            if state.mutating {
                let err = Error::validation(MUTATION_IN_PROGRESS);
                state
                    .status
                    .post(StatusKind::Warning, err.user_message(), self.config.status_ttl);
                return Err(err);
            }
            let (name, object_type) = state
                .selection
                .clone()
                .unwrap_or_else(|| (String::new(), ObjectType::Other(String::new())));
            let known: Option<ManagedObject> = state.store.find(&name, &object_type).cloned();
            let req = MutationRequest::new(name, object_type, comment.trim());

            if let Err(e) = self.coordinator.validate(action, &req, known.as_ref()) {
                state
                    .status
                    .post(StatusKind::Warning, e.user_message(), self.config.status_ttl);
                return Err(e);
            }
            state.mutating = true;
            (req, known)
        };

        let result = self
            .coordinator
            .perform(self.mutations.as_ref(), action, &req, known.as_ref())
            .await;

        let plan = {
            let mut state = self.state();
            state.mutating = false;
            if let Err(e) = result {
                state
                    .status
                    .post(StatusKind::Error, e.user_message(), self.config.status_ttl);
                return Err(e);
            }
            state.cache.invalidate();
            state.filter.forget_last_applied();
            self.coordinator.refresh_plan(state.filter.active_filter())
        };

        match self.follow_plan(plan).await {
            Ok(_) => {
                let verb = match action {
                    ObjectAction::Checkout => "Checked out",
                    ObjectAction::Checkin => "Checked in",
                };
                self.state().status.post(
                    StatusKind::Success,
                    format!("{} {}", verb, req.name),
                    self.config.status_ttl,
                );
            }
            // The mutation stands; the failed refresh already posted its error.
            Err(e) => warn!(error = %e, "Refresh after mutation failed"),
        }
        Ok(())
    }

    /// Write the selected object's DDL to `<dir>/<NAME>_<TYPE>.sql`.
    #[instrument(skip(self, dir), fields(
        subsystem = "staging",
        component = "browser",
        op = "export_ddl",
    ))]
    pub async fn export_ddl(&self, dir: &Path) -> Result<PathBuf> {
        let selection = self.state().selection.clone();
        let result = self.write_ddl(selection, dir).await;
        let mut state = self.state();
        match &result {
            Ok(path) => {
                let file = path.file_name().map(|f| f.to_string_lossy().into_owned());
                state.status.post(
                    StatusKind::Success,
                    format!("Exported {}", file.unwrap_or_default()),
                    self.config.status_ttl,
                );
            }
            Err(e) => {
                let kind = if e.is_validation() {
                    StatusKind::Warning
                } else {
                    StatusKind::Error
                };
                state.status.post(kind, e.user_message(), self.config.status_ttl);
            }
        }
        result
    }

    async fn write_ddl(
        &self,
        selection: Option<(String, ObjectType)>,
        dir: &Path,
    ) -> Result<PathBuf> {
        let (name, object_type) = selection
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| Error::validation("Enter the object name"))?;

        let ddl = self
            .executor
            .fetch_ddl(&object_type, &name)
            .await?
            .filter(|ddl| !ddl.trim().is_empty())
            .ok_or_else(|| Error::validation(DDL_NOT_FOUND))?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(ddl_file_name(&name, &object_type));
        tokio::fs::write(&path, ddl).await?;
        info!(object_name = %name, path = %path.display(), "DDL exported");
        Ok(path)
    }

    // =========================================================================
    // PRESENTATION
    // =========================================================================

    pub fn snapshot(&self) -> BrowserSnapshot {
        let state = self.state();
        let window = state.store.window();
        BrowserSnapshot {
            rows: state.store.page(),
            current_page: window.current_page(),
            total_pages: window.total_pages(),
            total_records: window.total_records(),
            page_size: window.page_size(),
            can_go_previous: window.can_go_previous(),
            can_go_next: window.can_go_next(),
            sort: state.sort,
            sort_label: state.sort.label(),
            busy: state.in_flight || state.mutating,
            status: state.status.view(),
            selection: self.selection_view(&state),
        }
    }

    pub fn status(&self) -> Option<StatusView> {
        self.state().status.view()
    }

    pub fn is_busy(&self) -> bool {
        let state = self.state();
        state.in_flight || state.mutating
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.state().cache.stats()
    }

    pub fn cached_signature(&self) -> Option<QuerySignature> {
        self.state().cache.signature().cloned()
    }

    /// The filter the current view was built from, if any.
    pub fn active_filter(&self) -> Option<AppliedFilter> {
        self.state().filter.active_filter().cloned()
    }
}

/// Export file name, e.g. `PKG_ORDERS_PACKAGE_BODY.sql`.
pub fn ddl_file_name(name: &str, object_type: &ObjectType) -> String {
    format!("{}_{}.sql", name.trim().to_uppercase(), object_type.metadata_name())
}

fn summary(kind: &QueryKind, count: usize) -> String {
    match kind {
        QueryKind::UserCheckouts { .. } if count == 0 => {
            "You have no checked-out objects".to_string()
        }
        QueryKind::UserCheckouts { .. } => {
            format!("Loaded {} objects checked out to you", count)
        }
        QueryKind::Search { .. } => format!("Found {} objects", count),
        QueryKind::All { .. } => format!("Object list reloaded ({} objects)", count),
        QueryKind::ObjectStatus { name } => format!("Found {} entries for {}", count, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovc_core::{FilterSpec, SortField};

    #[test]
    fn test_ddl_file_name() {
        assert_eq!(
            ddl_file_name("pkg_orders", &ObjectType::PackageBody),
            "PKG_ORDERS_PACKAGE_BODY.sql"
        );
        assert_eq!(ddl_file_name("V_SALES", &ObjectType::View), "V_SALES_VIEW.sql");
    }

    #[test]
    fn test_summary_messages() {
        let mine = QueryKind::UserCheckouts {
            user: "ALICE".to_string(),
        };
        assert_eq!(summary(&mine, 0), "You have no checked-out objects");
        assert_eq!(summary(&mine, 2), "Loaded 2 objects checked out to you");

        let search = QueryKind::Search {
            filter: FilterSpec {
                column: SearchColumn::Name,
                term: "pkg".to_string(),
            },
            sort: SortSpec::new(SortField::Name, true),
        };
        assert_eq!(summary(&search, 7), "Found 7 objects");

        let all = QueryKind::All {
            sort: SortSpec::default(),
        };
        assert_eq!(summary(&all, 120), "Object list reloaded (120 objects)");
    }
}
