//! Policy storage.
//!
//! The decision point never owns policies; it asks a [`PolicyStore`] for the
//! candidates that could apply to a request. A store may over-select, but it
//! must never drop a policy whose targets match the request identifiers.
//!
//! [`MemoryPolicyStore`] is the reference implementation: a thread-safe map
//! with a per-field target index and JSON snapshot persistence. Relational
//! backends can keep identical wildcard semantics with
//! [`glob::to_sql_like`](crate::glob::to_sql_like).

mod index;
mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::policy::Policy;
use crate::validation::ValidationError;

pub use memory::MemoryPolicyStore;

/// Errors returned by policy stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("policy not found: {0}")]
    NotFound(String),

    #[error("policy already exists: {0}")]
    AlreadyExists(String),

    #[error("page size must be greater than zero")]
    InvalidPage,

    #[error("policy store lock poisoned")]
    Poisoned,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid policy at index {index} of snapshot: {source}")]
    InvalidPolicy {
        index: usize,
        #[source]
        source: ValidationError,
    },
}

/// Result type for policy store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract consumed by the decision point.
pub trait PolicyStore: Send + Sync {
    /// Adds a new policy. Fails if the uid is taken.
    fn create(&self, policy: Policy) -> StoreResult<()>;

    /// Replaces an existing policy.
    fn update(&self, policy: Policy) -> StoreResult<()>;

    /// Removes a policy together with its index entries.
    fn delete(&self, uid: &str) -> StoreResult<()>;

    fn get(&self, uid: &str) -> StoreResult<Arc<Policy>>;

    /// Returns one page of policies ordered by uid. Pages are zero-based.
    fn get_all(&self, page: usize, page_size: usize) -> StoreResult<Vec<Arc<Policy>>>;

    /// Returns every policy whose targets could match the identifiers.
    fn find_candidates(
        &self,
        subject_id: &str,
        resource_id: &str,
        action_id: &str,
    ) -> StoreResult<Vec<Arc<Policy>>>;
}
