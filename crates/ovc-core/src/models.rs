//! Core data models for object version control.
//!
//! These types are shared across all crates and represent catalog entries
//! as materialized from raw query rows.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{trace, warn};

use crate::defaults;

// =============================================================================
// RAW ROWS
// =============================================================================

/// One row as returned by the query boundary: column name to string value.
///
/// The shape is opaque to the boundary; materialization treats absent
/// columns as empty strings.
pub type RawRow = HashMap<String, String>;

/// Column names understood by [`ManagedObject::from_row`].
pub mod columns {
    pub const NAME: &str = "name";
    pub const OBJECT_TYPE: &str = "object_type";
    pub const CHECKED_OUT: &str = "checked_out";
    pub const HELD_BY: &str = "held_by";
    pub const CHECKOUT_AT: &str = "checkout_at";
    pub const CHECKIN_AT: &str = "checkin_at";
    pub const COMMENT: &str = "comment";
    pub const IS_CONTROLLED: &str = "is_controlled";
}

fn column<'a>(row: &'a RawRow, name: &str) -> &'a str {
    row.get(name).map(String::as_str).unwrap_or("")
}

// =============================================================================
// OBJECT TYPE
// =============================================================================

/// Kind of catalog object under version control.
///
/// Spellings outside the known set are preserved in `Other` so that a
/// row with an unexpected type is still displayed rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Package,
    PackageBody,
    Procedure,
    Function,
    Trigger,
    Type,
    TypeBody,
    View,
    Other(String),
}

impl ObjectType {
    /// Parse a catalog spelling. Never fails.
    ///
    /// Accepts the spaced form (`PACKAGE BODY`), the metadata form
    /// (`PACKAGE_BODY`) and the squashed form (`PACKAGEBODY`), in any case.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "PACKAGE" => Self::Package,
            "PACKAGE BODY" | "PACKAGE_BODY" | "PACKAGEBODY" => Self::PackageBody,
            "PROCEDURE" => Self::Procedure,
            "FUNCTION" => Self::Function,
            "TRIGGER" => Self::Trigger,
            "TYPE" => Self::Type,
            "TYPE BODY" | "TYPE_BODY" | "TYPEBODY" => Self::TypeBody,
            "VIEW" => Self::View,
            t if t.contains("PACKAGE") && t.contains("BODY") => Self::PackageBody,
            t if t.contains("TYPE") && t.contains("BODY") => Self::TypeBody,
            _ => Self::Other(upper),
        }
    }

    /// Spelling used by the catalog table and shown to users.
    pub fn as_catalog_str(&self) -> &str {
        match self {
            Self::Package => "PACKAGE",
            Self::PackageBody => "PACKAGE BODY",
            Self::Procedure => "PROCEDURE",
            Self::Function => "FUNCTION",
            Self::Trigger => "TRIGGER",
            Self::Type => "TYPE",
            Self::TypeBody => "TYPE BODY",
            Self::View => "VIEW",
            Self::Other(s) => s,
        }
    }

    /// Name expected by the metadata API when extracting DDL.
    pub fn metadata_name(&self) -> String {
        self.as_catalog_str().replace(' ', "_")
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_catalog_str())
    }
}

// =============================================================================
// CHECKOUT STATUS
// =============================================================================

/// Displayed lock state of a catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// Exclusively held by `held_by`.
    CheckedOut,
    /// Under control and available.
    Free,
    /// Known to the catalog but not tracked.
    Uncontrolled,
}

impl CheckoutStatus {
    /// Key used when sorting by status (ordinal string comparison).
    pub fn sort_key(&self) -> &'static str {
        match self {
            Self::CheckedOut => defaults::STATUS_FLAG_CHECKED_OUT,
            Self::Free => defaults::STATUS_FLAG_FREE,
            Self::Uncontrolled => "U",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CheckedOut => "Checked out",
            Self::Free => "Free",
            Self::Uncontrolled => "Uncontrolled",
        }
    }
}

impl std::fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckedOut => write!(f, "checked_out"),
            Self::Free => write!(f, "free"),
            Self::Uncontrolled => write!(f, "uncontrolled"),
        }
    }
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Parse a catalog timestamp.
///
/// Accepts the display format (`DD/MM/YYYY HH:MM`, optionally with
/// seconds), ISO `YYYY-MM-DD HH:MM:SS` and RFC 3339. Empty or unparsable
/// input yields `None`, which sorts as the earliest instant.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in [
        defaults::TIMESTAMP_FORMAT,
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.naive_utc())
}

/// Format a timestamp for display; absent timestamps render empty.
pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(defaults::TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

// =============================================================================
// MANAGED OBJECT
// =============================================================================

/// One catalog entry under version control.
///
/// Immutable once materialized: state changes arrive by re-fetching, never
/// by patching an instance in place.
///
/// Invariants upheld by [`ManagedObject::from_row`]:
/// - `status == CheckedOut` implies `held_by` is non-empty
/// - `!is_controlled` implies `status == Uncontrolled` and `held_by` is empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedObject {
    pub name: String,
    pub object_type: ObjectType,
    pub status: CheckoutStatus,
    pub held_by: String,
    pub checkout_at: Option<NaiveDateTime>,
    pub checkin_at: Option<NaiveDateTime>,
    pub comment: String,
    pub is_controlled: bool,
}

impl ManagedObject {
    /// Materialize an object from a raw row, defensively.
    ///
    /// Missing columns default to empty strings. Rows that violate the
    /// invariants are normalized with a warning instead of rejected.
    pub fn from_row(row: &RawRow) -> Self {
        let name = column(row, columns::NAME).trim().to_string();
        let is_controlled = !column(row, columns::IS_CONTROLLED)
            .trim()
            .eq_ignore_ascii_case(defaults::CONTROLLED_FLAG_NO);
        let flag = column(row, columns::CHECKED_OUT).trim();
        let mut held_by = column(row, columns::HELD_BY).trim().to_string();

        let status = if !is_controlled {
            if !held_by.is_empty() {
                warn!(object_name = %name, "Uncontrolled object reported a holder; clearing it");
                held_by.clear();
            }
            CheckoutStatus::Uncontrolled
        } else if flag.eq_ignore_ascii_case(defaults::STATUS_FLAG_CHECKED_OUT) {
            if held_by.is_empty() {
                warn!(object_name = %name, "Checked-out object has no holder; treating as free");
                CheckoutStatus::Free
            } else {
                CheckoutStatus::CheckedOut
            }
        } else {
            CheckoutStatus::Free
        };

        trace!(object_name = %name, %status, "Materialized row");

        Self {
            name,
            object_type: ObjectType::parse(column(row, columns::OBJECT_TYPE)),
            status,
            held_by,
            checkout_at: parse_timestamp(column(row, columns::CHECKOUT_AT)),
            checkin_at: parse_timestamp(column(row, columns::CHECKIN_AT)),
            comment: column(row, columns::COMMENT).to_string(),
            is_controlled,
        }
    }

    /// Encode back into the raw row shape.
    pub fn to_row(&self) -> RawRow {
        let flag = match self.status {
            CheckoutStatus::CheckedOut => defaults::STATUS_FLAG_CHECKED_OUT,
            _ => defaults::STATUS_FLAG_FREE,
        };
        let controlled = if self.is_controlled { "Y" } else { "N" };
        [
            (columns::NAME, self.name.clone()),
            (columns::OBJECT_TYPE, self.object_type.as_catalog_str().to_string()),
            (columns::CHECKED_OUT, flag.to_string()),
            (columns::HELD_BY, self.held_by.clone()),
            (columns::CHECKOUT_AT, format_timestamp(self.checkout_at)),
            (columns::CHECKIN_AT, format_timestamp(self.checkin_at)),
            (columns::COMMENT, self.comment.clone()),
            (columns::IS_CONTROLLED, controlled.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    pub fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }

    /// Whether `user` currently holds this object (case-insensitive).
    pub fn is_held_by(&self, user: &str) -> bool {
        self.status == CheckoutStatus::CheckedOut
            && self.held_by.to_uppercase() == user.to_uppercase()
    }

    /// Case-insensitive identity match on name and type.
    pub fn matches(&self, name: &str, object_type: &ObjectType) -> bool {
        self.name.eq_ignore_ascii_case(name.trim()) && &self.object_type == object_type
    }
}
