//! Target index.
//!
//! One index per identifier field. Literal patterns go into a hash lookup;
//! wildcard patterns are kept per policy and matched with [`glob::matches`].
//! A lookup returns exactly the policies whose field patterns match, so the
//! intersection over the three fields equals [`Target::matches`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::glob;
use crate::target::{Patterns, Target};

#[derive(Debug, Default)]
struct FieldIndex {
    exact: HashMap<String, BTreeSet<String>>,
    wildcard: BTreeMap<String, Vec<String>>,
}

impl FieldIndex {
    fn insert(&mut self, uid: &str, patterns: &Patterns) {
        for pattern in patterns.as_slice() {
            if glob::is_wildcard(pattern) {
                self.wildcard
                    .entry(uid.to_string())
                    .or_default()
                    .push(pattern.clone());
            } else {
                self.exact
                    .entry(pattern.clone())
                    .or_default()
                    .insert(uid.to_string());
            }
        }
    }

    fn remove(&mut self, uid: &str, patterns: &Patterns) {
        self.wildcard.remove(uid);
        for pattern in patterns.as_slice() {
            if let Some(uids) = self.exact.get_mut(pattern) {
                uids.remove(uid);
                if uids.is_empty() {
                    self.exact.remove(pattern);
                }
            }
        }
    }

    fn lookup(&self, id: &str) -> BTreeSet<&str> {
        let exact = self
            .exact
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str);
        let wildcard = self
            .wildcard
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|p| glob::matches(p, id)))
            .map(|(uid, _)| uid.as_str());
        exact.chain(wildcard).collect()
    }

    fn len(&self) -> usize {
        self.exact.values().map(BTreeSet::len).sum::<usize>()
            + self.wildcard.values().map(Vec::len).sum::<usize>()
    }
}

/// Index rows for the three identifier fields of every stored policy.
#[derive(Debug, Default)]
pub(crate) struct TargetIndex {
    subject: FieldIndex,
    resource: FieldIndex,
    action: FieldIndex,
}

impl TargetIndex {
    pub(crate) fn insert(&mut self, uid: &str, target: &Target) {
        self.subject.insert(uid, &target.subject_id);
        self.resource.insert(uid, &target.resource_id);
        self.action.insert(uid, &target.action_id);
    }

    pub(crate) fn remove(&mut self, uid: &str, target: &Target) {
        self.subject.remove(uid, &target.subject_id);
        self.resource.remove(uid, &target.resource_id);
        self.action.remove(uid, &target.action_id);
    }

    /// Uids of the policies whose targets match all three identifiers,
    /// in uid order.
    pub(crate) fn lookup(
        &self,
        subject_id: &str,
        resource_id: &str,
        action_id: &str,
    ) -> Vec<&str> {
        let subjects = self.subject.lookup(subject_id);
        if subjects.is_empty() {
            return Vec::new();
        }
        let resources = self.resource.lookup(resource_id);
        let actions = self.action.lookup(action_id);
        subjects
            .into_iter()
            .filter(|uid| resources.contains(uid) && actions.contains(uid))
            .collect()
    }

    /// Total number of index rows.
    pub(crate) fn len(&self) -> usize {
        self.subject.len() + self.resource.len() + self.action.len()
    }
}
