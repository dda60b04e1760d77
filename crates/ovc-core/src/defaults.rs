//! Centralized default constants for object version control.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates should reference these constants instead of defining their own
//! magic numbers.

use crate::search::{SortField, SortSpec};

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for the staged object list.
///
/// Also the fallback whenever user input for the page size is empty,
/// unparsable, or non-positive.
pub const PAGE_SIZE: usize = 50;

/// First page number (pages are 1-based).
pub const FIRST_PAGE: usize = 1;

// =============================================================================
// SORTING
// =============================================================================

/// Default sort field: most recent checkout first.
pub const SORT_FIELD: SortField = SortField::CheckoutTime;

/// Default sort direction (descending).
pub const SORT_ASCENDING: bool = false;

/// Default sort specification.
pub const SORT: SortSpec = SortSpec {
    field: SORT_FIELD,
    ascending: SORT_ASCENDING,
};

// =============================================================================
// STATUS MESSAGES
// =============================================================================

/// How long a completion/error message stays visible, in milliseconds.
pub const STATUS_TTL_MS: u64 = 2_000;

/// How long a sort confirmation stays visible, in milliseconds.
pub const SORT_STATUS_TTL_MS: u64 = 1_500;

// =============================================================================
// CATALOG ENCODINGS
// =============================================================================

/// Status flag stored for checked-out objects.
pub const STATUS_FLAG_CHECKED_OUT: &str = "Y";

/// Status flag stored for free (and uncontrolled) objects.
pub const STATUS_FLAG_FREE: &str = "N";

/// Controlled flag value marking an object as not under version control.
pub const CONTROLLED_FLAG_NO: &str = "N";

/// Display format for checkout/checkin timestamps.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Fallback user name when neither configuration nor environment names one.
pub const UNKNOWN_USER: &str = "UNKNOWN";
