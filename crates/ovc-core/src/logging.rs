//! Structured logging schema and field name constants.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Broken internal state, requires attention |
//! | WARN  | Recoverable issue, remote failure, defensive normalization applied |
//! | INFO  | Operation completions (fetch committed, checkout done) |
//! | DEBUG | Decision points (cache hit, suppressed search, stale discard) |
//! | TRACE | Per-item iteration (row materialization) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "staging", "catalog"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "browser", "query_cache", "coordinator", "memory_catalog"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "reload", "sort", "checkout"
pub const OPERATION: &str = "op";

/// Fetch generation counter used for supersession checks.
pub const GENERATION: &str = "generation";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Catalog object name being operated on.
pub const OBJECT_NAME: &str = "object_name";

/// Catalog object type.
pub const OBJECT_TYPE: &str = "object_type";

/// Encoded query signature.
pub const QUERY: &str = "query";

/// User on whose behalf the operation runs.
pub const USER: &str = "user";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Page number after an operation.
pub const PAGE: &str = "page";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
