use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use nova_classfile::SigNode;
use nova_config::{BoundFailurePolicy, REFLECT_TARGET};
use parking_lot::RwLock;

use crate::class::LoaderId;
use crate::decl::DeclarationKey;
use crate::ty::ParameterizedType;

/// Identity of a canonical parameterized type.
///
/// Besides the structural signature and the declaration it was resolved in, the key records the
/// loader that resolved its class references and the bound failure policy its lazy parts were
/// built with, so resolvers that differ in either never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    node: Arc<SigNode>,
    declaration: DeclarationKey,
    loader: LoaderId,
    policy: BoundFailurePolicy,
}

impl CacheKey {
    pub fn new(
        node: Arc<SigNode>,
        declaration: DeclarationKey,
        loader: LoaderId,
        policy: BoundFailurePolicy,
    ) -> Self {
        Self {
            node,
            declaration,
            loader,
            policy,
        }
    }

    pub fn node(&self) -> &SigNode {
        &self.node
    }

    pub fn declaration(&self) -> &DeclarationKey {
        &self.declaration
    }

    pub fn loader(&self) -> LoaderId {
        self.loader
    }

    pub fn policy(&self) -> BoundFailurePolicy {
        self.policy
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Candidates discarded because another thread published first.
    pub lost_races: u64,
    pub entries: usize,
}

/// Interning table for resolved parameterized types.
///
/// Canonicalization is best-effort: two threads resolving the same key may both build a
/// candidate, and the one published first is what later lookups see. Entries are never evicted.
#[derive(Default)]
pub struct CanonicalCache {
    entries: RwLock<HashMap<CacheKey, ParameterizedType>>,
    hits: AtomicU64,
    misses: AtomicU64,
    lost_races: AtomicU64,
}

static GLOBAL: OnceLock<Arc<CanonicalCache>> = OnceLock::new();

impl CanonicalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by every resolver built with caching enabled.
    pub fn global() -> Arc<CanonicalCache> {
        GLOBAL.get_or_init(|| Arc::new(CanonicalCache::new())).clone()
    }

    pub fn lookup(&self, key: &CacheKey) -> Option<ParameterizedType> {
        let found = self.entries.read().get(key).cloned();
        match &found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(target: REFLECT_TARGET, node = %key.node, "canonical cache hit");
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(target: REFLECT_TARGET, node = %key.node, "canonical cache miss");
            }
        }
        found
    }

    /// Publish `candidate` unless an entry already exists; returns whichever is canonical.
    pub fn insert_if_absent(&self, key: CacheKey, candidate: ParameterizedType) -> ParameterizedType {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&key) {
            self.lost_races.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                target: REFLECT_TARGET,
                node = %key.node,
                declaration = ?key.declaration,
                loader = ?key.loader,
                "lost canonicalization race; adopting published entry"
            );
            return existing.clone();
        }
        entries.insert(key, candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            lost_races: self.lost_races.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl std::fmt::Debug for CanonicalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalCache")
            .field("stats", &self.stats())
            .finish()
    }
}
