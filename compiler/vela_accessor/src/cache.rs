//! Process-lifetime accessor cache.
//!
//! Partitioned by `(model type, result type)`, then by shape category, since
//! each category has its own key space: a simple member and a captured member
//! can share a [`MemberKey`] while denoting different accessors. Entries are
//! never removed; the key space is bounded by the program's accessor call
//! sites, not by traffic.
//!
//! Compilation runs outside every map lock. Two threads missing on the same key
//! may both compile; the first insert wins and both return the stored accessor.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use vela_ir::{MemberKey, Name};

use crate::key::MemberChainKey;
use crate::Accessor;

type AccessorMap<K> = DashMap<K, Accessor, FxBuildHasher>;

/// Cache partition: one per `(model type, result type)` pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub model_type: Name,
    pub result_type: Name,
}

/// Shape category of a cached accessor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    Identity,
    SimpleMember,
    ChainedMember,
    StaticMember,
    CapturedConstant,
}

impl CacheCategory {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        match self {
            CacheCategory::Identity => 0,
            CacheCategory::SimpleMember => 1,
            CacheCategory::ChainedMember => 2,
            CacheCategory::StaticMember => 3,
            CacheCategory::CapturedConstant => 4,
        }
    }
}

/// Where an accessor lives within a partition.
#[derive(Clone, Debug)]
pub enum CacheSlot {
    /// The partition's single `m => m` accessor.
    Identity,
    SimpleMember(MemberKey),
    ChainedMember(MemberChainKey),
    StaticMember(MemberKey),
    /// Compiled projection for a captured member; not the final accessor.
    CapturedConstant(MemberKey),
}

impl CacheSlot {
    pub fn category(&self) -> CacheCategory {
        match self {
            CacheSlot::Identity => CacheCategory::Identity,
            CacheSlot::SimpleMember(_) => CacheCategory::SimpleMember,
            CacheSlot::ChainedMember(_) => CacheCategory::ChainedMember,
            CacheSlot::StaticMember(_) => CacheCategory::StaticMember,
            CacheSlot::CapturedConstant(_) => CacheCategory::CapturedConstant,
        }
    }
}

#[derive(Default)]
struct Partition {
    identity: OnceLock<Accessor>,
    simple: AccessorMap<MemberKey>,
    chained: AccessorMap<MemberChainKey>,
    statics: AccessorMap<MemberKey>,
    captured: AccessorMap<MemberKey>,
}

impl Partition {
    fn len(&self) -> usize {
        usize::from(self.identity.get().is_some())
            + self.simple.len()
            + self.chained.len()
            + self.statics.len()
            + self.captured.len()
    }
}

/// Hit and miss counts for one category.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub hits: u64,
    pub misses: u64,
}

/// Snapshot of the cache counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    categories: [CategoryStats; CacheCategory::COUNT],
}

impl CacheStats {
    pub fn category(&self, category: CacheCategory) -> CategoryStats {
        self.categories[category.index()]
    }

    pub fn hits(&self) -> u64 {
        self.categories.iter().map(|c| c.hits).sum()
    }

    pub fn misses(&self) -> u64 {
        self.categories.iter().map(|c| c.misses).sum()
    }
}

#[derive(Default)]
struct Counter {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Concurrent accessor cache.
#[derive(Default)]
pub struct AccessorCache {
    partitions: DashMap<PartitionKey, Arc<Partition>, FxBuildHasher>,
    counters: [Counter; CacheCategory::COUNT],
}

impl AccessorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the accessor stored for `slot` in `partition`, compiling and
    /// storing it with `compile` on a miss.
    ///
    /// `compile` returning `None` stores nothing and yields `None`.
    pub fn get_or_compile(
        &self,
        partition: PartitionKey,
        slot: CacheSlot,
        compile: impl FnOnce() -> Option<Accessor>,
    ) -> Option<Accessor> {
        let category = slot.category();
        let counter = &self.counters[category.index()];
        let partition = self.partition(partition);
        let found = match slot {
            CacheSlot::Identity => {
                if let Some(found) = partition.identity.get() {
                    counter.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(Arc::clone(found));
                }
                counter.misses.fetch_add(1, Ordering::Relaxed);
                let compiled = compile()?;
                return Some(Arc::clone(partition.identity.get_or_init(|| compiled)));
            }
            CacheSlot::SimpleMember(key) => lookup(&partition.simple, key, counter, compile),
            CacheSlot::ChainedMember(key) => lookup(&partition.chained, key, counter, compile),
            CacheSlot::StaticMember(key) => lookup(&partition.statics, key, counter, compile),
            CacheSlot::CapturedConstant(key) => {
                lookup(&partition.captured, key, counter, compile)
            }
        };
        if found.is_none() {
            tracing::debug!(?category, "accessor not compiled; nothing cached");
        }
        found
    }

    /// Number of cached accessors across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `(model type, result type)` partitions created so far.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for (slot, counter) in stats.categories.iter_mut().zip(&self.counters) {
            slot.hits = counter.hits.load(Ordering::Relaxed);
            slot.misses = counter.misses.load(Ordering::Relaxed);
        }
        stats
    }

    fn partition(&self, key: PartitionKey) -> Arc<Partition> {
        if let Some(found) = self.partitions.get(&key) {
            return Arc::clone(found.value());
        }
        tracing::trace!(
            model_type = %key.model_type,
            result_type = %key.result_type,
            "creating accessor cache partition"
        );
        Arc::clone(self.partitions.entry(key).or_default().value())
    }
}

fn lookup<K: Eq + Hash>(
    map: &AccessorMap<K>,
    key: K,
    counter: &Counter,
    compile: impl FnOnce() -> Option<Accessor>,
) -> Option<Accessor> {
    if let Some(found) = map.get(&key) {
        counter.hits.fetch_add(1, Ordering::Relaxed);
        return Some(Arc::clone(found.value()));
    }
    counter.misses.fetch_add(1, Ordering::Relaxed);
    let compiled = compile()?;
    let stored = map.entry(key).or_insert(compiled);
    Some(Arc::clone(stored.value()))
}
