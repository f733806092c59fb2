//! The `CompletenessTable` backing a [`crate::cache::CacheAdapter`].
//!
//! Chosen once at construction between a Safe (LRU-ordered, size-bounded)
//! backend and a Fast (unordered, unbounded) backend — spec §4.4.3
//! forbids branching on the mode per call, so this is a two-variant enum
//! whose variant is fixed for the adapter's lifetime, mirroring
//! `TreeCache::{Lru, Full}` in the teacher's `idx/trees/store/cache.rs`.
//! Matching on the variant is not the forbidden per-call mode check: the
//! variant itself never changes after construction, unlike a boolean
//! flag re-read and branched on every hit.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use quick_cache::sync::Cache as QuickCache;
use quick_cache::{DefaultHashBuilder, Lifecycle, UnitWeighter};

// `quick_cache::sync::Cache` is itself a thin handle over shared internal
// state (like an `Arc`) and is `Clone` accordingly; `Fast` mode is given
// the same cheap-clone shape explicitly via `Arc<DashMap<..>>` so a
// `Table` can be cloned into a spawned scan future regardless of mode.

/// Shared eviction counter, bumped by `quick_cache`'s eviction hook.
/// Mirrors `NodeIdsTracker`'s role in the teacher, minus the need to also
/// track node ids ourselves — `quick_cache` already owns that state.
#[derive(Clone, Default)]
pub(crate) struct EvictionTracker(Arc<AtomicU64>);

impl EvictionTracker {
	pub(crate) fn count(&self) -> u64 {
		self.0.load(Ordering::Relaxed)
	}
}

impl<K, V> Lifecycle<K, V> for EvictionTracker {
	type RequestState = ();

	fn begin_request(&self) -> Self::RequestState {}

	fn on_evict(&self, _state: &mut Self::RequestState, _key: K, _val: V) {
		self.0.fetch_add(1, Ordering::Relaxed);
	}
}

type SafeMap<K, V> = QuickCache<K, V, UnitWeighter, DefaultHashBuilder, EvictionTracker>;

/// A key→value map with two possible backends, chosen once at
/// construction.
pub(crate) enum Table<K, V> {
	/// LRU-ordered, `capacity`-bounded (spec invariant 3).
	Safe(SafeMap<K, V>, EvictionTracker),
	/// Unordered, unbounded (spec §4.4.3, E6).
	Fast(Arc<DashMap<K, V>>),
}

impl<K, V> Clone for Table<K, V>
where
	K: Eq + Hash + Clone + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	fn clone(&self) -> Self {
		match self {
			Table::Safe(c, t) => Table::Safe(c.clone(), t.clone()),
			Table::Fast(m) => Table::Fast(m.clone()),
		}
	}
}

impl<K, V> Table<K, V>
where
	K: Eq + Hash + Clone + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	pub(crate) fn safe(capacity: usize) -> Self {
		let tracker = EvictionTracker::default();
		// quick_cache requires capacity >= 2 or its internal segments
		// collapse to zero usable slots.
		let capacity = capacity.max(2);
		let map = QuickCache::with(
			capacity,
			capacity as u64,
			DefaultHashBuilder::default(),
			UnitWeighter,
			tracker.clone(),
		);
		Table::Safe(map, tracker)
	}

	pub(crate) fn fast() -> Self {
		Table::Fast(Arc::new(DashMap::new()))
	}

	/// A hit moves the entry to MRU position in Safe mode (spec invariant
	/// 4); `quick_cache::get` already does this internally.
	pub(crate) fn get(&self, key: &K) -> Option<V> {
		match self {
			Table::Safe(c, _) => c.get(key),
			Table::Fast(m) => m.get(key).map(|r| r.value().clone()),
		}
	}

	pub(crate) fn insert(&self, key: K, value: V) {
		match self {
			Table::Safe(c, _) => c.insert(key, value),
			Table::Fast(m) => {
				m.insert(key, value);
			}
		}
	}

	pub(crate) fn remove(&self, key: &K) {
		match self {
			Table::Safe(c, _) => {
				c.remove(key);
			}
			Table::Fast(m) => {
				m.remove(key);
			}
		}
	}

	pub(crate) fn len(&self) -> usize {
		match self {
			Table::Safe(c, _) => c.len(),
			Table::Fast(m) => m.len(),
		}
	}

	pub(crate) fn evictions(&self) -> u64 {
		match self {
			Table::Safe(_, tracker) => tracker.count(),
			Table::Fast(_) => 0,
		}
	}
}
