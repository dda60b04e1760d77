//! # ovc-staging
//!
//! Client-side result staging for object version control.
//!
//! This crate provides:
//! - A single-entry query cache keyed by normalized query signatures
//! - The staged result set with clamped page windows
//! - Stable, table-driven sorting
//! - Search filter validation and de-duplication
//! - Checkout/checkin coordination and action eligibility
//! - [`ObjectBrowser`], which sequences all of the above behind
//!   generation-checked fetches
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ovc_staging::{BrowserConfig, InMemoryCatalog, ObjectBrowser, SearchColumn};
//!
//! let catalog = Arc::new(InMemoryCatalog::from_json("alice", rows_json)?);
//! let browser = ObjectBrowser::new(catalog.clone(), catalog, BrowserConfig::load()?);
//!
//! browser.load_user_checkouts().await?;
//! browser.search(SearchColumn::Name, "PKG_").await?;
//! browser.sort_by(SortField::Name);
//! let view = browser.snapshot();
//! ```

pub mod browser;
pub mod cache;
pub mod coordinator;
pub mod filter;
pub mod memory;
pub mod sort;
pub mod status;
pub mod store;

// Re-export core types
pub use ovc_core::*;

pub use browser::{BrowserSnapshot, FetchOutcome, ObjectBrowser, SelectionView};
pub use cache::{CacheStats, QueryCache};
pub use coordinator::{evaluate, ActionEligibility, ObjectAction, ObjectStateCoordinator};
pub use filter::{AppliedFilter, FilterDecision, SearchFilterController};
pub use memory::{CatalogCall, InMemoryCatalog};
pub use sort::{sort_objects, Comparator};
pub use status::{StatusBoard, StatusKind, StatusView};
pub use store::{PageRow, PageWindow, ResultStagingStore};
