//! # ovc-core
//!
//! Core types, traits, and abstractions for object version control.
//!
//! This crate provides the data model for catalog objects, the error
//! taxonomy, the query signature used as a cache key, and the boundary
//! traits through which the staging engine reaches the remote catalog.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod search;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{parse_page_size, BrowserConfig};
pub use error::{Error, Result};
pub use models::*;
pub use query::{QueryKind, QuerySignature};
pub use search::*;
pub use traits::*;
