//! Search filter validation, normalization, and de-duplication.

use ovc_core::defaults;
use ovc_core::{Error, FilterSpec, Result, SearchColumn};
use tracing::debug;

/// Message shown when a search is attempted without choosing a column.
pub const NO_COLUMN_MESSAGE: &str = "Select a column to search.";

/// Column and term as the user entered them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFilter {
    pub column: SearchColumn,
    pub term: String,
}

/// Outcome of a search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Dispatch this filter to the query boundary.
    Execute(FilterSpec),
    /// Identical to the last applied filter; nothing to do.
    Suppressed,
}

/// Map a user term to its dispatched form for `column`.
///
/// For [`SearchColumn::Status`], any term containing "check"
/// (case-insensitive) becomes the checked-out flag and any other non-empty
/// term the free flag. Other columns pass the term through.
pub fn transform_term(column: SearchColumn, term: &str) -> String {
    let term = term.trim();
    match column {
        SearchColumn::Status if term.is_empty() => String::new(),
        SearchColumn::Status => {
            if term.to_lowercase().contains("check") {
                defaults::STATUS_FLAG_CHECKED_OUT.to_string()
            } else {
                defaults::STATUS_FLAG_FREE.to_string()
            }
        }
        _ => term.to_string(),
    }
}

/// Validates search requests and remembers the last applied one.
///
/// Two memories are kept: `active` is the filter the current view was built
/// from (re-applied after a checkout/checkin), `last_applied` drives
/// de-duplication and can be forgotten independently to force a refetch.
#[derive(Debug, Default)]
pub struct SearchFilterController {
    active: Option<AppliedFilter>,
    last_applied: Option<AppliedFilter>,
}

impl SearchFilterController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize a filter.
    pub fn build_filter(&self, column: SearchColumn, term: &str) -> Result<FilterSpec> {
        if column.is_placeholder() {
            return Err(Error::validation(NO_COLUMN_MESSAGE));
        }
        Ok(FilterSpec {
            column,
            term: transform_term(column, term),
        })
    }

    /// Whether `(column, term)` repeats the last applied non-empty filter.
    pub fn is_redundant(&self, column: SearchColumn, term: &str) -> bool {
        let term = term.trim();
        !term.is_empty()
            && self
                .last_applied
                .as_ref()
                .is_some_and(|last| last.column == column && last.term == term)
    }

    /// Validate, then de-duplicate.
    pub fn decide(&self, column: SearchColumn, term: &str) -> Result<FilterDecision> {
        let filter = self.build_filter(column, term)?;
        if self.is_redundant(column, term) {
            debug!(%column, term, "Search suppressed, identical to last applied filter");
            return Ok(FilterDecision::Suppressed);
        }
        Ok(FilterDecision::Execute(filter))
    }

    /// Record a filter whose results were committed.
    pub fn mark_applied(&mut self, column: SearchColumn, term: &str) {
        let applied = AppliedFilter {
            column,
            term: term.trim().to_string(),
        };
        self.active = Some(applied.clone());
        self.last_applied = Some(applied);
    }

    /// Forget the de-duplication memory so the next identical request runs.
    pub fn forget_last_applied(&mut self) {
        self.last_applied = None;
    }

    /// Forget everything (the view no longer derives from a filter).
    pub fn clear(&mut self) {
        self.active = None;
        self.last_applied = None;
    }

    /// The filter the current view is built from, when it has a term.
    pub fn active_filter(&self) -> Option<&AppliedFilter> {
        self.active.as_ref().filter(|f| !f.term.is_empty())
    }

    pub fn last_applied(&self) -> Option<&AppliedFilter> {
        self.last_applied.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_rejected() {
        let ctl = SearchFilterController::new();
        let err = ctl.build_filter(SearchColumn::Placeholder, "pkg").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.user_message(), NO_COLUMN_MESSAGE);
    }

    #[test]
    fn test_status_term_transform() {
        assert_eq!(transform_term(SearchColumn::Status, "Checked out"), "Y");
        assert_eq!(transform_term(SearchColumn::Status, "CHECK"), "Y");
        assert_eq!(transform_term(SearchColumn::Status, "free"), "N");
        assert_eq!(transform_term(SearchColumn::Status, "whatever"), "N");
        assert_eq!(transform_term(SearchColumn::Status, "  "), "");
        assert_eq!(transform_term(SearchColumn::Name, " Pkg "), "Pkg");
    }

    #[test]
    fn test_build_filter_applies_transform() {
        let ctl = SearchFilterController::new();
        let filter = ctl.build_filter(SearchColumn::Status, "check-out").unwrap();
        assert_eq!(filter.column, SearchColumn::Status);
        assert_eq!(filter.term, "Y");
    }

    #[test]
    fn test_identical_request_suppressed_after_apply() {
        let mut ctl = SearchFilterController::new();
        assert!(matches!(
            ctl.decide(SearchColumn::Name, "pkg").unwrap(),
            FilterDecision::Execute(_)
        ));
        ctl.mark_applied(SearchColumn::Name, "pkg");

        assert_eq!(
            ctl.decide(SearchColumn::Name, "pkg").unwrap(),
            FilterDecision::Suppressed
        );
        assert!(matches!(
            ctl.decide(SearchColumn::User, "pkg").unwrap(),
            FilterDecision::Execute(_)
        ));
        assert!(matches!(
            ctl.decide(SearchColumn::Name, "pkg2").unwrap(),
            FilterDecision::Execute(_)
        ));
    }

    #[test]
    fn test_empty_term_never_suppressed() {
        let mut ctl = SearchFilterController::new();
        ctl.mark_applied(SearchColumn::Name, "");
        assert!(matches!(
            ctl.decide(SearchColumn::Name, "").unwrap(),
            FilterDecision::Execute(_)
        ));
        assert!(ctl.active_filter().is_none());
    }

    #[test]
    fn test_placeholder_checked_before_dedup() {
        let mut ctl = SearchFilterController::new();
        ctl.mark_applied(SearchColumn::Name, "pkg");
        assert!(ctl.decide(SearchColumn::Placeholder, "pkg").is_err());
    }

    #[test]
    fn test_forget_keeps_active_filter() {
        let mut ctl = SearchFilterController::new();
        ctl.mark_applied(SearchColumn::Comment, "hotfix");
        ctl.forget_last_applied();

        assert!(ctl.last_applied().is_none());
        assert_eq!(ctl.active_filter().unwrap().term, "hotfix");
        assert!(matches!(
            ctl.decide(SearchColumn::Comment, "hotfix").unwrap(),
            FilterDecision::Execute(_)
        ));

        ctl.clear();
        assert!(ctl.active_filter().is_none());
    }
}
