//! Boundary traits for the remote catalog.
//!
//! These traits define the interfaces the staging engine consumes, enabling
//! pluggable backends and testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ObjectType, RawRow};
use crate::query::QuerySignature;

// =============================================================================
// QUERY EXECUTION
// =============================================================================

/// Executes catalog queries.
///
/// Implementations fail with [`crate::Error::Remote`] on connectivity,
/// timeout, or permission failures.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run the query described by `query` and return its unordered rows.
    async fn execute(&self, query: &QuerySignature) -> Result<Vec<RawRow>>;

    /// Fetch the DDL source of one object. `None` when the catalog has none.
    async fn fetch_ddl(&self, object_type: &ObjectType, name: &str) -> Result<Option<String>>;
}

// =============================================================================
// MUTATION
// =============================================================================

/// Request for a checkout or checkin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub name: String,
    pub object_type: ObjectType,
    pub comment: String,
}

impl MutationRequest {
    pub fn new(
        name: impl Into<String>,
        object_type: ObjectType,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            object_type,
            comment: comment.into(),
        }
    }
}

/// State-changing catalog operations.
///
/// The remote system is the source of truth for exclusivity; callers only
/// pre-validate.
#[async_trait]
pub trait CatalogMutation: Send + Sync {
    /// Acquire the exclusive edit lock on an object.
    async fn checkout(&self, req: &MutationRequest) -> Result<()>;

    /// Release the exclusive edit lock on an object.
    async fn checkin(&self, req: &MutationRequest) -> Result<()>;
}
