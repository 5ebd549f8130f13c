use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;

use crate::models::{AppInfo, RiskLevel, ScoredApp};
use crate::risk::engine;

/// The aggregated scan result: scored apps keyed by `package_name`.
///
/// Keying is last-write-wins: a later record with the same package replaces
/// the earlier one in place, keeping its original position. The ranked view
/// sorts by score descending with a stable tie-break on insertion order.
#[derive(Debug, Default)]
pub struct AppCollection {
    order: Vec<String>,
    by_package: HashMap<String, ScoredApp>,
}

impl AppCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score every normalized record and aggregate, in input order.
    pub fn collect<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AppInfo>,
    {
        let mut collection = Self::new();
        for app in records {
            collection.insert(engine::assess(app));
        }
        collection
    }

    pub fn insert(&mut self, scored: ScoredApp) {
        let key = scored.app.package_name.clone();
        if !self.by_package.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.by_package.insert(key, scored);
    }

    pub fn get(&self, package_name: &str) -> Option<&ScoredApp> {
        self.by_package.get(package_name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Apps in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ScoredApp> {
        self.order.iter().filter_map(|key| self.by_package.get(key))
    }

    /// Presentation view: descending by risk score, stable for ties.
    pub fn ranked(&self) -> Vec<&ScoredApp> {
        let mut apps: Vec<&ScoredApp> = self.iter().collect();
        apps.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        apps
    }

    pub fn count_level(&self, level: RiskLevel) -> usize {
        self.iter().filter(|a| a.risk_level == level).count()
    }
}

/// Process-lifetime holder for the scan result: computed once, read many
/// times, recomputed only through an explicit [`refresh_with`]
/// (`AppStore::refresh_with`) call.
#[derive(Debug, Default)]
pub struct AppStore {
    inner: RwLock<Option<Arc<AppCollection>>>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<Arc<AppCollection>> {
        self.inner.read().expect("poisoned app store lock").clone()
    }

    /// Return the cached collection, computing it on first use.
    pub fn load_with<F>(&self, loader: F) -> Result<Arc<AppCollection>>
    where
        F: FnOnce() -> Result<AppCollection>,
    {
        if let Some(existing) = self.snapshot() {
            return Ok(existing);
        }
        self.refresh_with(loader)
    }

    /// Recompute unconditionally and replace the cached collection.
    pub fn refresh_with<F>(&self, loader: F) -> Result<Arc<AppCollection>>
    where
        F: FnOnce() -> Result<AppCollection>,
    {
        let fresh = Arc::new(loader()?);
        *self.inner.write().expect("poisoned app store lock") = Some(Arc::clone(&fresh));
        Ok(fresh)
    }
}
