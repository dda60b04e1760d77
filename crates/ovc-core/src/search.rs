//! Sort and search specification types.
//!
//! The set of sortable fields and searchable columns is closed: every
//! variant maps to a concrete comparator or query column at compile time.

use serde::{Deserialize, Serialize};

// =============================================================================
// SORT
// =============================================================================

/// Field the staged result set can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Type,
    Status,
    User,
    CheckoutTime,
    CheckinTime,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Name,
        SortField::Type,
        SortField::Status,
        SortField::User,
        SortField::CheckoutTime,
        SortField::CheckinTime,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Type => "Object type",
            Self::Status => "Status",
            Self::User => "User",
            Self::CheckoutTime => "Checkout time",
            Self::CheckinTime => "Checkin time",
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Type => write!(f, "type"),
            Self::Status => write!(f, "status"),
            Self::User => write!(f, "user"),
            Self::CheckoutTime => write!(f, "checkout_time"),
            Self::CheckinTime => write!(f, "checkin_time"),
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "type" | "object_type" => Ok(Self::Type),
            "status" => Ok(Self::Status),
            "user" | "held_by" => Ok(Self::User),
            "checkout_time" | "checkout" | "checkout_at" => Ok(Self::CheckoutTime),
            "checkin_time" | "checkin" | "checkin_at" => Ok(Self::CheckinTime),
            _ => Err(format!("Unknown sort field: {}", s)),
        }
    }
}

/// Sort field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        crate::defaults::SORT
    }
}

impl SortSpec {
    pub fn new(field: SortField, ascending: bool) -> Self {
        Self { field, ascending }
    }

    pub fn direction(&self) -> &'static str {
        if self.ascending {
            "asc"
        } else {
            "desc"
        }
    }

    /// Indicator text, e.g. `Checkout time (desc)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.field.label(), self.direction())
    }

    /// Same field, opposite direction.
    pub fn toggled(&self) -> Self {
        Self {
            field: self.field,
            ascending: !self.ascending,
        }
    }
}

impl std::fmt::Display for SortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.field, self.direction())
    }
}

/// Parses `field` or `field:asc|desc`. A bare field sorts descending.
impl std::str::FromStr for SortSpec {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (field, dir) = match s.split_once(':') {
            Some((f, d)) => (f, Some(d)),
            None => (s, None),
        };
        let field: SortField = field.parse()?;
        let ascending = match dir.map(|d| d.trim().to_lowercase()) {
            None => false,
            Some(d) if d == "asc" || d == "ascending" => true,
            Some(d) if d == "desc" || d == "descending" => false,
            Some(d) => return Err(format!("Unknown sort direction: {}", d)),
        };
        Ok(Self { field, ascending })
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// Column a search term is matched against.
///
/// `Placeholder` is the "no column selected" entry of the picker; a search
/// against it is rejected before reaching the query boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchColumn {
    #[default]
    Placeholder,
    Name,
    Type,
    Status,
    User,
    Comment,
}

impl SearchColumn {
    /// Picker entries in display order, placeholder first.
    pub const ALL: [SearchColumn; 6] = [
        SearchColumn::Placeholder,
        SearchColumn::Name,
        SearchColumn::Type,
        SearchColumn::Status,
        SearchColumn::User,
        SearchColumn::Comment,
    ];

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Placeholder => "Column",
            Self::Name => "Name",
            Self::Type => "Type",
            Self::Status => "Status",
            Self::User => "User",
            Self::Comment => "Comment",
        }
    }
}

impl std::fmt::Display for SearchColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placeholder => write!(f, ""),
            Self::Name => write!(f, "name"),
            Self::Type => write!(f, "type"),
            Self::Status => write!(f, "status"),
            Self::User => write!(f, "user"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for SearchColumn {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(Self::Placeholder),
            "name" => Ok(Self::Name),
            "type" | "object_type" => Ok(Self::Type),
            "status" => Ok(Self::Status),
            "user" | "held_by" => Ok(Self::User),
            "comment" | "comments" => Ok(Self::Comment),
            _ => Err(format!("Unknown search column: {}", s)),
        }
    }
}

/// Validated filter ready for dispatch.
///
/// `term` is the dispatched form: for [`SearchColumn::Status`] it is the
/// status flag encoding rather than the text the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    pub column: SearchColumn,
    pub term: String,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }
}
