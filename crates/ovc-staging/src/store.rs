//! Staged result set and page window.
//!
//! The store owns the full, unpaginated result of the most recent fetch and
//! derives the visible page from it. Paging and re-sorting operate purely on
//! the materialized set and never trigger a fetch.

use ovc_core::defaults;
use ovc_core::{ManagedObject, ObjectType, RawRow, SortSpec};
use serde::Serialize;
use tracing::{debug, trace};

use crate::sort::sort_objects;

// =============================================================================
// PAGE WINDOW
// =============================================================================

/// `max(1, ceil(total_records / page_size))`.
pub fn total_pages_for(total_records: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_records.div_ceil(page_size).max(1)
}

/// Paging state derived from the staged set.
///
/// Invariant: `1 <= current_page <= total_pages()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    page_size: usize,
    current_page: usize,
    total_records: usize,
}

impl PageWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: if page_size == 0 {
                defaults::PAGE_SIZE
            } else {
                page_size
            },
            current_page: defaults::FIRST_PAGE,
            total_records: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn total_pages(&self) -> usize {
        total_pages_for(self.total_records, self.page_size)
    }

    /// Half-open index range of the current page within the staged set.
    pub fn bounds(&self) -> (usize, usize) {
        let start = (self.current_page - 1) * self.page_size;
        let end = (self.current_page * self.page_size).min(self.total_records);
        (start.min(end), end)
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    fn reset(&mut self, total_records: usize) {
        self.total_records = total_records;
        self.current_page = defaults::FIRST_PAGE;
    }

    fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages())
    }
}

// =============================================================================
// PAGE ROWS
// =============================================================================

/// One row of the visible page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRow {
    /// Zero-based position within the page, not within the staged set.
    pub display_index: usize,
    /// Alternating-row styling flag, a pure function of `display_index`.
    pub is_alternate: bool,
    pub object: ManagedObject,
}

// =============================================================================
// STAGING STORE
// =============================================================================

/// Owns the staged result set of the current view.
#[derive(Debug, Clone)]
pub struct ResultStagingStore {
    objects: Vec<ManagedObject>,
    window: PageWindow,
}

impl Default for ResultStagingStore {
    fn default() -> Self {
        Self::new(defaults::PAGE_SIZE)
    }
}

impl ResultStagingStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            objects: Vec::new(),
            window: PageWindow::new(page_size),
        }
    }

    /// Replace the staged set wholesale with materialized `rows`.
    ///
    /// Resets to page 1. An empty sequence yields an empty single page.
    pub fn load(&mut self, rows: &[RawRow]) {
        let objects = rows.iter().map(ManagedObject::from_row).collect();
        self.replace(objects);
    }

    /// Replace the staged set with already materialized objects.
    pub fn replace(&mut self, objects: Vec<ManagedObject>) {
        self.objects = objects;
        self.window.reset(self.objects.len());
        debug!(
            result_count = self.objects.len(),
            total_pages = self.window.total_pages(),
            "Staged result set replaced"
        );
    }

    /// Drop the staged set (in-flight reset before a new fetch).
    pub fn clear(&mut self) {
        self.objects.clear();
        self.window.reset(0);
    }

    /// The current page, with page-relative display indices.
    pub fn page(&self) -> Vec<PageRow> {
        let (start, end) = self.window.bounds();
        self.objects[start..end]
            .iter()
            .enumerate()
            .map(|(display_index, object)| PageRow {
                display_index,
                is_alternate: display_index % 2 == 1,
                object: object.clone(),
            })
            .collect()
    }

    /// Move to page `n`, clamped into `[1, total_pages]`.
    ///
    /// Returns whether the current page changed.
    pub fn go_to_page(&mut self, n: usize) -> bool {
        let target = self.window.clamp(n);
        if target == self.window.current_page {
            trace!(page = target, "Already on requested page");
            return false;
        }
        self.window.current_page = target;
        debug!(page = target, requested = n, "Moved to page");
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.window.current_page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.go_to_page(self.window.current_page.saturating_sub(1))
    }

    pub fn first_page(&mut self) -> bool {
        self.go_to_page(1)
    }

    pub fn last_page(&mut self) -> bool {
        self.go_to_page(self.window.total_pages())
    }

    /// Change the page size; `0` falls back to the default.
    ///
    /// Works on the materialized set only. Resets to page 1 when the set is
    /// non-empty (an empty set is always on page 1).
    pub fn set_page_size(&mut self, n: usize) {
        let size = if n == 0 { defaults::PAGE_SIZE } else { n };
        self.window.page_size = size;
        if !self.objects.is_empty() {
            self.window.current_page = defaults::FIRST_PAGE;
        }
        self.window.current_page = self.window.clamp(self.window.current_page);
    }

    /// Re-order the whole staged set and return to page 1.
    pub fn apply_sort(&mut self, spec: SortSpec) {
        sort_objects(&mut self.objects, spec);
        self.window.current_page = defaults::FIRST_PAGE;
    }

    pub fn objects(&self) -> &[ManagedObject] {
        &self.objects
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Find a staged object by case-insensitive name and type.
    pub fn find(&self, name: &str, object_type: &ObjectType) -> Option<&ManagedObject> {
        self.objects.iter().find(|o| o.matches(name, object_type))
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn current_page(&self) -> usize {
        self.window.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.window.total_pages()
    }

    pub fn total_records(&self) -> usize {
        self.window.total_records()
    }

    pub fn page_size(&self) -> usize {
        self.window.page_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovc_core::SortField;

    fn rows(n: usize) -> Vec<RawRow> {
        (0..n)
            .map(|i| RawRow::from([("name".to_string(), format!("OBJ_{:03}", i))]))
            .collect()
    }

    #[test]
    fn test_total_pages_formula() {
        assert_eq!(total_pages_for(0, 50), 1);
        assert_eq!(total_pages_for(1, 50), 1);
        assert_eq!(total_pages_for(50, 50), 1);
        assert_eq!(total_pages_for(51, 50), 2);
        assert_eq!(total_pages_for(120, 50), 3);
        assert_eq!(total_pages_for(7, 0), 7);
    }

    #[test]
    fn test_total_pages_property() {
        for page_size in 1..=13 {
            for total in 0..=60 {
                let expected = std::cmp::max(1, (total + page_size - 1) / page_size);
                assert_eq!(total_pages_for(total, page_size), expected);
            }
        }
    }

    #[test]
    fn test_load_120_rows_last_page() {
        let mut store = ResultStagingStore::new(50);
        store.load(&rows(120));
        assert_eq!(store.total_records(), 120);
        assert_eq!(store.total_pages(), 3);
        assert_eq!(store.current_page(), 1);

        assert!(store.go_to_page(3));
        let page = store.page();
        assert_eq!(page.len(), 20);
        let indices: Vec<usize> = page.iter().map(|r| r.display_index).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
        assert_eq!(page[0].object.name, "OBJ_100");
    }

    #[test]
    fn test_load_empty() {
        let mut store = ResultStagingStore::new(50);
        store.load(&rows(10));
        store.load(&[]);
        assert_eq!(store.total_records(), 0);
        assert_eq!(store.total_pages(), 1);
        assert_eq!(store.current_page(), 1);
        assert!(store.page().is_empty());
    }

    #[test]
    fn test_load_resets_to_first_page() {
        let mut store = ResultStagingStore::new(10);
        store.load(&rows(35));
        store.go_to_page(4);
        store.load(&rows(35));
        assert_eq!(store.current_page(), 1);
    }

    #[test]
    fn test_go_to_page_clamps() {
        let mut store = ResultStagingStore::new(10);
        store.load(&rows(25));

        assert!(store.go_to_page(99));
        assert_eq!(store.current_page(), 3);
        assert!(!store.go_to_page(3));

        assert!(store.go_to_page(0));
        assert_eq!(store.current_page(), 1);
    }

    #[test]
    fn test_navigation_helpers() {
        let mut store = ResultStagingStore::new(10);
        store.load(&rows(25));

        assert!(!store.previous_page());
        assert!(store.next_page());
        assert!(store.last_page());
        assert_eq!(store.current_page(), 3);
        assert!(!store.next_page());
        assert!(!store.window().can_go_next());
        assert!(store.window().can_go_previous());
        assert!(store.first_page());
        assert_eq!(store.current_page(), 1);
    }

    #[test]
    fn test_page_never_exceeds_page_size() {
        for total in [0usize, 1, 9, 10, 11, 47] {
            let mut store = ResultStagingStore::new(10);
            store.load(&rows(total));
            for page in 1..=store.total_pages() {
                store.go_to_page(page);
                let (start, end) = store.window().bounds();
                assert!(end <= total);
                assert!(store.page().len() <= 10);
                assert_eq!(store.page().len(), end - start);
            }
        }
    }

    #[test]
    fn test_set_page_size_rederives_without_refetch() {
        let mut store = ResultStagingStore::new(50);
        store.load(&rows(120));
        store.go_to_page(2);

        store.set_page_size(25);
        assert_eq!(store.total_pages(), 5);
        assert_eq!(store.current_page(), 1);
        assert_eq!(store.total_records(), 120);

        store.set_page_size(0);
        assert_eq!(store.page_size(), 50);
    }

    #[test]
    fn test_set_page_size_on_empty_store() {
        let mut store = ResultStagingStore::new(50);
        store.set_page_size(5);
        assert_eq!(store.page_size(), 5);
        assert_eq!(store.current_page(), 1);
        assert_eq!(store.total_pages(), 1);
    }

    #[test]
    fn test_apply_sort_resets_page() {
        let mut store = ResultStagingStore::new(2);
        store.load(&rows(5));
        store.go_to_page(3);

        store.apply_sort(SortSpec::new(SortField::Name, false));
        assert_eq!(store.current_page(), 1);
        assert_eq!(store.page()[0].object.name, "OBJ_004");
    }

    #[test]
    fn test_display_index_is_page_relative_and_alternates() {
        let mut store = ResultStagingStore::new(3);
        store.load(&rows(7));
        store.go_to_page(2);
        let page = store.page();
        assert_eq!(page[0].display_index, 0);
        assert!(!page[0].is_alternate);
        assert!(page[1].is_alternate);

        let row = serde_json::to_value(&page[1]).unwrap();
        assert_eq!(row["display_index"], 1);
        assert_eq!(row["is_alternate"], true);
    }

    #[test]
    fn test_clear_and_find() {
        let mut store = ResultStagingStore::new(10);
        store.load(&rows(3));
        let other = ObjectType::Other(String::new());
        assert!(store.find("obj_001", &other).is_some());

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.total_pages(), 1);
        assert!(store.find("OBJ_001", &other).is_none());
    }
}
