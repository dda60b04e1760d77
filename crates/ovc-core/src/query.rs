//! Query signatures: the normalized cache key for a query.
//!
//! A signature is the query text plus its bound parameters, with
//! parameters ordered by key so that two signatures built from the same
//! parameters in a different order encode to the same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::search::{FilterSpec, SearchColumn, SortSpec};

/// Query text for the objects checked out by one user.
pub const QUERY_USER_CHECKOUTS: &str = "objects.checked_out_by";

/// Query text for a column search.
pub const QUERY_SEARCH: &str = "objects.search";

/// Query text for the full inventory.
pub const QUERY_ALL: &str = "objects.all";

/// Query text for a single object's status, matched on the exact name.
pub const QUERY_OBJECT_STATUS: &str = "objects.status";

/// Parameter names bound by [`QueryKind::signature`].
pub mod params {
    pub const USER: &str = "user";
    pub const NAME: &str = "name";
    pub const COLUMN: &str = "column";
    pub const TERM: &str = "term";
    pub const SORT_FIELD: &str = "sort_field";
    pub const SORT_DIRECTION: &str = "sort_direction";
}

/// Normalized, order-independent encoding of a query.
///
/// Equality and hashing use the encoded bytes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySignature {
    text: String,
    params: BTreeMap<String, String>,
    encoded: String,
}

impl QuerySignature {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let encoded = escape(&text);
        Self {
            text,
            params: BTreeMap::new(),
            encoded,
        }
    }

    /// Bind a parameter. Rebinding a key replaces its value.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self.encoded = self.encode();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// The normalized encoding compared for equality.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    fn encode(&self) -> String {
        let mut out = escape(&self.text);
        for (k, v) in &self.params {
            out.push('|');
            out.push_str(&escape(k));
            out.push('=');
            out.push_str(&escape(v));
        }
        out
    }
}

impl PartialEq for QuerySignature {
    fn eq(&self, other: &Self) -> bool {
        self.encoded.as_bytes() == other.encoded.as_bytes()
    }
}

impl Eq for QuerySignature {}

impl std::hash::Hash for QuerySignature {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl std::fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encoded)
    }
}

// Keeps the encoding injective when values contain separators.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '|' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// QUERY KINDS
// =============================================================================

/// The queries the staging engine issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// Objects currently checked out by `user`.
    UserCheckouts { user: String },
    /// Objects matching a column filter.
    Search { filter: FilterSpec, sort: SortSpec },
    /// The whole inventory.
    All { sort: SortSpec },
    /// Every type stored under `name` (case-insensitive exact match).
    ObjectStatus { name: String },
}

impl QueryKind {
    pub fn signature(&self) -> QuerySignature {
        match self {
            Self::UserCheckouts { user } => {
                QuerySignature::new(QUERY_USER_CHECKOUTS).with_param(params::USER, user.clone())
            }
            Self::Search { filter, sort } => QuerySignature::new(QUERY_SEARCH)
                .with_param(params::COLUMN, filter.column.to_string())
                .with_param(params::TERM, filter.term.clone())
                .with_param(params::SORT_FIELD, sort.field.to_string())
                .with_param(params::SORT_DIRECTION, sort.direction()),
            Self::All { sort } => QuerySignature::new(QUERY_ALL)
                .with_param(params::SORT_FIELD, sort.field.to_string())
                .with_param(params::SORT_DIRECTION, sort.direction()),
            Self::ObjectStatus { name } => {
                QuerySignature::new(QUERY_OBJECT_STATUS).with_param(params::NAME, name.clone())
            }
        }
    }

    /// Decode a signature produced by [`QueryKind::signature`].
    ///
    /// Used by executors that interpret signatures themselves.
    pub fn from_signature(sig: &QuerySignature) -> Result<Self> {
        let sort = || -> Result<SortSpec> {
            let field = required(sig, params::SORT_FIELD)?;
            let dir = required(sig, params::SORT_DIRECTION)?;
            format!("{}:{}", field, dir)
                .parse()
                .map_err(Error::Remote)
        };
        match sig.text() {
            QUERY_USER_CHECKOUTS => Ok(Self::UserCheckouts {
                user: required(sig, params::USER)?.to_string(),
            }),
            QUERY_SEARCH => {
                let column: SearchColumn = required(sig, params::COLUMN)?
                    .parse()
                    .map_err(Error::Remote)?;
                Ok(Self::Search {
                    filter: FilterSpec {
                        column,
                        term: required(sig, params::TERM)?.to_string(),
                    },
                    sort: sort()?,
                })
            }
            QUERY_ALL => Ok(Self::All { sort: sort()? }),
            QUERY_OBJECT_STATUS => Ok(Self::ObjectStatus {
                name: required(sig, params::NAME)?.to_string(),
            }),
            other => Err(Error::Remote(format!("Unknown query: {}", other))),
        }
    }

    /// Operation name for logging.
    pub fn op(&self) -> &'static str {
        match self {
            Self::UserCheckouts { .. } => "user_checkouts",
            Self::Search { .. } => "search",
            Self::All { .. } => "reload_all",
            Self::ObjectStatus { .. } => "object_status",
        }
    }
}

fn required<'a>(sig: &'a QuerySignature, key: &str) -> Result<&'a str> {
    sig.param(key)
        .ok_or_else(|| Error::Remote(format!("Query {} is missing parameter {}", sig.text(), key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SortField;

    #[test]
    fn test_param_order_does_not_matter() {
        let a = QuerySignature::new("q").with_param("b", "2").with_param("a", "1");
        let b = QuerySignature::new("q").with_param("a", "1").with_param("b", "2");
        assert_eq!(a, b);
        assert_eq!(a.encoded(), "q|a=1|b=2");
    }

    #[test]
    fn test_different_values_differ() {
        let a = QuerySignature::new("q").with_param("term", "abc");
        let b = QuerySignature::new("q").with_param("term", "ABC");
        assert_ne!(a, b);
    }

    #[test]
    fn test_separator_injection_is_not_ambiguous() {
        let a = QuerySignature::new("q").with_param("a", "1|b=2");
        let b = QuerySignature::new("q").with_param("a", "1").with_param("b", "2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_rebinding_replaces_value() {
        let sig = QuerySignature::new("q").with_param("a", "1").with_param("a", "2");
        assert_eq!(sig.param("a"), Some("2"));
        assert_eq!(sig.params().len(), 1);
    }

    #[test]
    fn test_query_kind_signature_roundtrip() {
        let kinds = [
            QueryKind::UserCheckouts {
                user: "ALICE".to_string(),
            },
            QueryKind::Search {
                filter: FilterSpec {
                    column: SearchColumn::Name,
                    term: "pkg".to_string(),
                },
                sort: SortSpec::new(SortField::Name, true),
            },
            QueryKind::All {
                sort: SortSpec::default(),
            },
            QueryKind::ObjectStatus {
                name: "PKG_ORDERS".to_string(),
            },
        ];
        for kind in kinds {
            assert_eq!(QueryKind::from_signature(&kind.signature()).unwrap(), kind);
        }
    }

    #[test]
    fn test_from_signature_rejects_unknown_text() {
        let err = QueryKind::from_signature(&QuerySignature::new("objects.drop")).unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn test_sort_is_part_of_search_signature() {
        let filter = FilterSpec {
            column: SearchColumn::User,
            term: "bob".to_string(),
        };
        let asc = QueryKind::Search {
            filter: filter.clone(),
            sort: SortSpec::new(SortField::Name, true),
        };
        let desc = QueryKind::Search {
            filter,
            sort: SortSpec::new(SortField::Name, false),
        };
        assert_ne!(asc.signature(), desc.signature());
    }

    #[test]
    fn test_object_status_distinct_from_user_checkouts() {
        let status = QueryKind::ObjectStatus {
            name: "ALICE".to_string(),
        };
        let mine = QueryKind::UserCheckouts {
            user: "ALICE".to_string(),
        };
        assert_ne!(status.signature(), mine.signature());
        assert_eq!(status.signature().encoded(), "objects.status|name=ALICE");
    }
}
