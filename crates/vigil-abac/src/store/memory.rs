//! In-memory policy store.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, info};

use super::index::TargetIndex;
use super::{PolicyStore, StoreError, StoreResult};
use crate::policy::Policy;

#[derive(Debug, Default)]
struct Inner {
    policies: BTreeMap<String, Arc<Policy>>,
    index: TargetIndex,
}

impl Inner {
    fn insert(&mut self, policy: Policy) {
        let uid = policy.uid().to_string();
        self.index.insert(&uid, policy.targets());
        self.policies.insert(uid, Arc::new(policy));
    }

    fn remove(&mut self, uid: &str) -> Option<Arc<Policy>> {
        let removed = self.policies.remove(uid)?;
        self.index.remove(uid, removed.targets());
        Some(removed)
    }
}

/// Thread-safe in-memory [`PolicyStore`].
///
/// Policies are kept ordered by uid. The policy map and the target index sit
/// behind one lock, so every write updates both together and every read sees
/// a consistent snapshot.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    inner: RwLock<Inner>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a list of policies. Fails on a duplicate uid.
    pub fn with_policies(policies: impl IntoIterator<Item = Policy>) -> StoreResult<Self> {
        let store = Self::new();
        for policy in policies {
            store.create(policy)?;
        }
        Ok(store)
    }

    /// Loads a JSON snapshot: an array of policies.
    pub fn load_from_path(path: &Path) -> StoreResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Vec<Value> = serde_json::from_str(&text)?;

        let policies = raw
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                Policy::from_value(value)
                    .map_err(|source| StoreError::InvalidPolicy { index, source })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let store = Self::with_policies(policies)?;
        info!(path = %path.display(), policies = store.len()?, "loaded policy snapshot");
        Ok(store)
    }

    /// Writes every policy, ordered by uid, as a JSON array.
    ///
    /// The snapshot is written to a sibling temporary file and renamed into
    /// place, so readers never observe a partial file.
    pub fn save_to_path(&self, path: &Path) -> StoreResult<()> {
        let snapshot: Vec<Value> = self
            .read()?
            .policies
            .values()
            .map(|policy| policy.to_value())
            .collect();
        let text = serde_json::to_string_pretty(&snapshot)?;

        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;

        info!(path = %path.display(), policies = snapshot.len(), "saved policy snapshot");
        Ok(())
    }

    /// Number of stored policies.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.policies.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn create(&self, policy: Policy) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.policies.contains_key(policy.uid()) {
            return Err(StoreError::AlreadyExists(policy.uid().to_string()));
        }
        info!(
            uid = policy.uid(),
            effect = %policy.effect(),
            priority = policy.priority(),
            "policy created"
        );
        inner.insert(policy);
        Ok(())
    }

    fn update(&self, policy: Policy) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.remove(policy.uid()).is_none() {
            return Err(StoreError::NotFound(policy.uid().to_string()));
        }
        info!(
            uid = policy.uid(),
            effect = %policy.effect(),
            priority = policy.priority(),
            "policy updated"
        );
        inner.insert(policy);
        Ok(())
    }

    fn delete(&self, uid: &str) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner
            .remove(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        info!(uid, "policy deleted");
        Ok(())
    }

    fn get(&self, uid: &str) -> StoreResult<Arc<Policy>> {
        self.read()?
            .policies
            .get(uid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    fn get_all(&self, page: usize, page_size: usize) -> StoreResult<Vec<Arc<Policy>>> {
        if page_size == 0 {
            return Err(StoreError::InvalidPage);
        }
        let inner = self.read()?;
        Ok(inner
            .policies
            .values()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect())
    }

    fn find_candidates(
        &self,
        subject_id: &str,
        resource_id: &str,
        action_id: &str,
    ) -> StoreResult<Vec<Arc<Policy>>> {
        let inner = self.read()?;
        let candidates: Vec<Arc<Policy>> = inner
            .index
            .lookup(subject_id, resource_id, action_id)
            .into_iter()
            .filter_map(|uid| inner.policies.get(uid).cloned())
            .collect();
        debug!(
            subject_id,
            resource_id,
            action_id,
            candidates = candidates.len(),
            "candidate lookup"
        );
        Ok(candidates)
    }
}
