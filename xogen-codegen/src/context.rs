//! Run-scoped naming state.

use std::collections::{HashMap, HashSet};

use crate::{
    config::DEFAULT_CONFLICT_SUFFIX,
    naming::{DEFAULT_CONFLICTS, SHORT_NAME_SEEDS, derive_shortname},
};

/// Caches shared by every resolver call of one run.
///
/// A fresh context per run (or per test) isolates the short-name memo and
/// the per-scope duplicate sets.
#[derive(Debug, Clone)]
pub struct RunContext {
    shortnames: HashMap<String, String>,
    scope_dupes: HashMap<String, HashSet<String>>,
    conflict_suffix: String,
}

impl RunContext {
    /// An empty `conflict_suffix` falls back to the default one.
    pub fn new(conflict_suffix: impl Into<String>) -> Self {
        let mut conflict_suffix = conflict_suffix.into();
        if conflict_suffix.is_empty() {
            conflict_suffix = DEFAULT_CONFLICT_SUFFIX.to_string();
        }
        let shortnames = SHORT_NAME_SEEDS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            shortnames,
            scope_dupes: HashMap::new(),
            conflict_suffix,
        }
    }

    pub fn conflict_suffix(&self) -> &str {
        &self.conflict_suffix
    }

    /// Short identifier for `typ`, suffixed when it collides with a default
    /// import or one of `scope`.
    ///
    /// The derived base is memoized per type name; the collision check runs
    /// on every call.
    pub fn shortname(&mut self, typ: &str, scope: &[&str]) -> String {
        let base = self
            .shortnames
            .entry(typ.to_string())
            .or_insert_with(|| derive_shortname(typ))
            .clone();

        let collides = DEFAULT_CONFLICTS.contains(&base.as_str()) || scope.contains(&base.as_str());
        if collides {
            format!("{base}{}", self.conflict_suffix)
        } else {
            base
        }
    }

    /// The memoized base short name for `typ`, if derived or seeded.
    pub fn memoized_shortname(&self, typ: &str) -> Option<&str> {
        self.shortnames.get(typ).map(String::as_str)
    }

    /// Record `name` in `scope`; true when it was already recorded.
    pub fn is_dup(&mut self, name: &str, scope: &str) -> bool {
        !self
            .scope_dupes
            .entry(scope.to_string())
            .or_default()
            .insert(name.to_string())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(DEFAULT_CONFLICT_SUFFIX)
    }
}
