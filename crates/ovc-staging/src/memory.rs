//! In-process catalog.
//!
//! Implements both boundaries over a vector of objects, for embedders without
//! a remote backend and for deterministic testing. Every call is recorded so
//! tests can assert exactly what reached the boundary.
//!
//! ```rust,ignore
//! let catalog = Arc::new(InMemoryCatalog::new("ALICE").with_objects(objects));
//! let browser = ObjectBrowser::new(catalog.clone(), catalog.clone(), config);
//! browser.load_user_checkouts().await?;
//! assert_eq!(catalog.execute_count(), 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use ovc_core::defaults;
use ovc_core::{
    CatalogMutation, CheckoutStatus, Error, FilterSpec, ManagedObject, MutationRequest,
    ObjectType, QueryExecutor, QueryKind, QuerySignature, RawRow, Result, SearchColumn,
};
use tracing::{debug, trace};

use crate::sort::sort_objects;

/// One recorded boundary call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    Execute(QuerySignature),
    FetchDdl { object_type: ObjectType, name: String },
    Checkout(MutationRequest),
    Checkin(MutationRequest),
}

#[derive(Debug, Default)]
struct CatalogState {
    objects: Vec<ManagedObject>,
    ddl: HashMap<(String, ObjectType), String>,
    call_log: Vec<CatalogCall>,
    delays: VecDeque<Duration>,
    failures: VecDeque<String>,
}

/// Catalog held in memory.
#[derive(Debug)]
pub struct InMemoryCatalog {
    session_user: String,
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    /// Empty catalog; mutations are attributed to `session_user`.
    pub fn new(session_user: impl Into<String>) -> Self {
        Self {
            session_user: session_user.into().trim().to_uppercase(),
            state: Mutex::new(CatalogState::default()),
        }
    }

    /// Seed from a JSON array of raw rows.
    pub fn from_json(session_user: impl Into<String>, json: &str) -> Result<Self> {
        let rows: Vec<RawRow> = serde_json::from_str(json)?;
        let objects = rows.iter().map(ManagedObject::from_row).collect();
        Ok(Self::new(session_user).with_objects(objects))
    }

    pub fn with_objects(self, objects: Vec<ManagedObject>) -> Self {
        self.lock().objects = objects;
        self
    }

    pub fn with_ddl(self, name: &str, object_type: ObjectType, ddl: impl Into<String>) -> Self {
        self.lock()
            .ddl
            .insert((name.trim().to_uppercase(), object_type), ddl.into());
        self
    }

    /// Delay successive `execute` calls, one entry per call.
    pub fn with_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.lock().delays.extend(delays);
        self
    }

    /// Make the next boundary call fail with a remote error.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().failures.push_back(message.into());
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<CatalogCall> {
        self.lock().call_log.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().call_log.clear();
    }

    /// Signatures passed to `execute`, oldest first.
    pub fn executed(&self) -> Vec<QuerySignature> {
        self.lock()
            .call_log
            .iter()
            .filter_map(|c| match c {
                CatalogCall::Execute(sig) => Some(sig.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn execute_count(&self) -> usize {
        self.executed().len()
    }

    pub fn mutation_count(&self) -> usize {
        self.lock()
            .call_log
            .iter()
            .filter(|c| matches!(c, CatalogCall::Checkout(_) | CatalogCall::Checkin(_)))
            .count()
    }

    /// Current state of one object.
    pub fn object(&self, name: &str, object_type: &ObjectType) -> Option<ManagedObject> {
        self.lock()
            .objects
            .iter()
            .find(|o| o.matches(name, object_type))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: CatalogCall) -> Option<String> {
        let mut state = self.lock();
        state.call_log.push(call);
        state.failures.pop_front()
    }
}

/// Whether `object` matches a search filter.
///
/// Text columns match case-insensitive substrings. The status column
/// compares the flag exactly; the free flag also matches uncontrolled
/// objects. An empty term matches everything.
pub fn matches_filter(object: &ManagedObject, filter: &FilterSpec) -> bool {
    let term = filter.term.trim();
    if term.is_empty() {
        return true;
    }
    let contains = |value: &str| value.to_lowercase().contains(&term.to_lowercase());
    match filter.column {
        SearchColumn::Placeholder => false,
        SearchColumn::Name => contains(&object.name),
        SearchColumn::Type => contains(object.object_type.as_catalog_str()),
        SearchColumn::User => contains(&object.held_by),
        SearchColumn::Comment => contains(&object.comment),
        SearchColumn::Status => {
            let checked_out = object.status == CheckoutStatus::CheckedOut;
            if term.eq_ignore_ascii_case(defaults::STATUS_FLAG_CHECKED_OUT) {
                checked_out
            } else {
                !checked_out
            }
        }
    }
}

#[async_trait]
impl QueryExecutor for InMemoryCatalog {
    async fn execute(&self, query: &QuerySignature) -> Result<Vec<RawRow>> {
        let failure = self.record(CatalogCall::Execute(query.clone()));
        let delay = self.lock().delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = failure {
            return Err(Error::remote(message));
        }

        let kind = QueryKind::from_signature(query)?;
        let state = self.lock();
        let mut matched: Vec<ManagedObject> = match &kind {
            QueryKind::UserCheckouts { user } => state
                .objects
                .iter()
                .filter(|o| o.is_held_by(user))
                .cloned()
                .collect(),
            QueryKind::Search { filter, .. } => state
                .objects
                .iter()
                .filter(|o| matches_filter(o, filter))
                .cloned()
                .collect(),
            QueryKind::All { .. } => state.objects.clone(),
            QueryKind::ObjectStatus { name } => state
                .objects
                .iter()
                .filter(|o| o.name.eq_ignore_ascii_case(name.trim()))
                .cloned()
                .collect(),
        };
        match &kind {
            QueryKind::Search { sort, .. } | QueryKind::All { sort } => {
                sort_objects(&mut matched, *sort)
            }
            QueryKind::UserCheckouts { .. } | QueryKind::ObjectStatus { .. } => {}
        }

        debug!(query = %query, result_count = matched.len(), "In-memory query executed");
        Ok(matched.iter().map(ManagedObject::to_row).collect())
    }

    async fn fetch_ddl(&self, object_type: &ObjectType, name: &str) -> Result<Option<String>> {
        let failure = self.record(CatalogCall::FetchDdl {
            object_type: object_type.clone(),
            name: name.to_string(),
        });
        if let Some(message) = failure {
            return Err(Error::remote(message));
        }
        let key = (name.trim().to_uppercase(), object_type.clone());
        Ok(self.lock().ddl.get(&key).cloned())
    }
}

#[async_trait]
impl CatalogMutation for InMemoryCatalog {
    async fn checkout(&self, req: &MutationRequest) -> Result<()> {
        if let Some(message) = self.record(CatalogCall::Checkout(req.clone())) {
            return Err(Error::remote(message));
        }
        let mut state = self.lock();
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.matches(&req.name, &req.object_type))
            .ok_or_else(|| {
                Error::remote(format!("{} {} does not exist", req.object_type, req.name))
            })?;

        if object.status == CheckoutStatus::CheckedOut {
            return Err(Error::remote(format!(
                "{} is already checked out by {}",
                object.name, object.held_by
            )));
        }
        object.status = CheckoutStatus::CheckedOut;
        object.is_controlled = true;
        object.held_by = self.session_user.clone();
        object.checkout_at = Some(Local::now().naive_local());
        object.comment = req.comment.clone();
        trace!(object_name = %object.name, user = %self.session_user, "Object checked out");
        Ok(())
    }

    async fn checkin(&self, req: &MutationRequest) -> Result<()> {
        if let Some(message) = self.record(CatalogCall::Checkin(req.clone())) {
            return Err(Error::remote(message));
        }
        let mut state = self.lock();
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.matches(&req.name, &req.object_type))
            .ok_or_else(|| {
                Error::remote(format!("{} {} does not exist", req.object_type, req.name))
            })?;

        if !object.is_held_by(&self.session_user) {
            return Err(Error::remote(format!(
                "{} is not checked out by {}",
                object.name, self.session_user
            )));
        }
        object.status = CheckoutStatus::Free;
        object.held_by.clear();
        object.checkin_at = Some(Local::now().naive_local());
        object.comment = req.comment.clone();
        trace!(object_name = %object.name, user = %self.session_user, "Object checked in");
        Ok(())
    }
}
